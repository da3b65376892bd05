//! Error types for the device configuration crate

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Preference store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read store file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write store file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed store file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Failed to serialize store file {path}: {message}")]
    Serialize { path: String, message: String },

    #[error("No project directory available for the preference store")]
    NoProjectDir,
}

/// Device catalog errors.
///
/// Runtime enumeration failures never surface here; device systems degrade to
/// empty lists instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Device backend initialization failed: {0}")]
    InitFailed(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
