//! Preference store contract
//!
//! The store is a flat string-keyed map with typed accessors. Values are kept
//! as strings on the wire; typed getters parse and fall back to the supplied
//! default when the key is missing or unparseable, so callers never see an
//! error from a read.

pub mod file;
pub mod memory;

pub use file::TomlStore;
pub use memory::MemoryStore;

/// Store keys used by the device configuration.
///
/// These are the persisted wire format; renaming one orphans existing user
/// settings.
pub mod keys {
    /// Locator protocol of the selected audio system
    pub const AUDIO_SYSTEM: &str = "audio.system";

    /// Whether echo cancellation is performed on captured audio
    pub const AUDIO_ECHOCANCEL: &str = "audio.echocancel";

    /// Echo cancellation filter length in milliseconds
    pub const AUDIO_ECHOCANCEL_FILTER_LENGTH_MS: &str = "audio.echocancel.filter-length-ms";

    /// Whether noise suppression is performed on captured audio
    pub const AUDIO_DENOISE: &str = "audio.denoise";

    /// Name of the selected video capture device
    pub const VIDEO_DEVICE: &str = "video.device";

    /// Video capture height
    pub const VIDEO_HEIGHT: &str = "video.height";

    /// Video capture width
    pub const VIDEO_WIDTH: &str = "video.width";

    /// Video frame rate, -1 for unlimited
    pub const VIDEO_FRAMERATE: &str = "video.framerate";

    /// Maximum video bandwidth in kbit/s
    pub const VIDEO_MAX_BANDWIDTH: &str = "video.max-bandwidth";

    /// Whether audio systems without devices are hidden from selection lists
    pub const HIDE_DEVICELESS_AUDIO_SYSTEMS: &str = "devices.hide-deviceless-audio-systems";
}

/// Key-value preference store with typed accessors.
///
/// Implementations are internally synchronized; the configuration holds the
/// store behind an `Arc` and may share it with the hosting application.
pub trait PreferenceStore: Send + Sync {
    /// Get the raw string value for a key
    fn get_string(&self, key: &str) -> Option<String>;

    /// Set a raw string value
    fn set_string(&self, key: &str, value: &str);

    /// Remove a key; missing keys are not an error
    fn remove(&self, key: &str);

    /// Check whether a key is present
    fn contains(&self, key: &str) -> bool;

    /// Get an `i32` value, falling back to `default` when missing or invalid
    fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.get_string(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get an `i64` value, falling back to `default` when missing or invalid
    fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.get_string(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Get a `bool` value, falling back to `default` when missing or invalid
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_string(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Set an `i32` value
    fn set_i32(&self, key: &str, value: i32) {
        self.set_string(key, &value.to_string());
    }

    /// Set an `i64` value
    fn set_i64(&self, key: &str, value: i64) {
        self.set_string(key, &value.to_string());
    }

    /// Set a `bool` value
    fn set_bool(&self, key: &str, value: bool) {
        self.set_string(key, &value.to_string());
    }
}
