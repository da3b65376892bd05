//! # Media Device Config
//!
//! Device selection and preference persistence for a VoIP/IM media stack.
//!
//! The crate sits between a pluggable device catalog (audio systems, video
//! capture backends) and a key-value preference store, and owns the answer to
//! "which devices is the user talking through right now":
//!
//! ```text
//! ┌──────────────────┐      ┌───────────────────────────┐      ┌─────────────────┐
//! │  Device Catalog  │      │    DeviceConfiguration    │      │ Preference Store│
//! │  (catalog::*)    │◀────▶│      (config::*)          │◀────▶│   (store::*)    │
//! │                  │      │                           │      │                 │
//! │  audio systems   │      │  selected audio system    │      │  audio.system   │
//! │  video devices   │      │  selected video device    │      │  video.*        │
//! │  hotplug events  │      │  resolution / frame rate  │      │  audio.*        │
//! └──────────────────┘      │  bandwidth / AEC / NS     │      └─────────────────┘
//!                           └────────────┬──────────────┘
//!                                        │ ConfigEvent
//!                                        ▼
//!                           ┌───────────────────────────┐
//!                           │  subscribers (events::*)  │
//!                           │  call UI, media pipeline  │
//!                           └───────────────────────────┘
//! ```
//!
//! On construction [`config::DeviceConfiguration`] restores the persisted
//! selection, falling back to the first available backend, and from then on
//! republishes device and parameter changes to its subscribers. Hosts deliver
//! catalog and store change notifications through `handle_device_event` and
//! `handle_preference_change`; the configuration itself does no locking and
//! expects a single event-delivery context.

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod store;

pub use error::{Error, Result};

/// Crate-wide defaults and reserved constants
pub mod constants {
    use crate::catalog::VideoSize;

    /// Default video frame rate, `-1` means unlimited
    pub const DEFAULT_VIDEO_FRAMERATE: i32 = -1;

    /// Default video width
    pub const DEFAULT_VIDEO_WIDTH: u32 = 640;

    /// Default video height
    pub const DEFAULT_VIDEO_HEIGHT: u32 = 480;

    /// Default maximum video bandwidth in kbit/s
    pub const DEFAULT_VIDEO_MAX_BANDWIDTH: u32 = 256;

    /// Default echo cancellation setting
    pub const DEFAULT_AUDIO_ECHOCANCEL: bool = true;

    /// Default echo cancellation filter length in milliseconds.
    /// Roughly a third of a small room's reverberation time (~300 ms).
    pub const DEFAULT_AUDIO_ECHOCANCEL_FILTER_LENGTH_MS: i64 = 100;

    /// Default noise suppression setting
    pub const DEFAULT_AUDIO_DENOISE: bool = true;

    /// Locator protocol of the reserved "no audio device" system
    pub const NONE_PROTOCOL: &str = "none";

    /// Locator protocol of the screen/image streaming video backend
    pub const IMGSTREAMING_PROTOCOL: &str = "imgstreaming";

    /// Resolutions offered for user selection
    pub const SUPPORTED_RESOLUTIONS: [VideoSize; 7] = [
        // QVGA
        VideoSize::new(160, 100),
        // QCIF
        VideoSize::new(176, 144),
        VideoSize::new(320, 200),
        VideoSize::new(320, 240),
        // CIF
        VideoSize::new(352, 288),
        // VGA
        VideoSize::new(640, 480),
        // HD 720
        VideoSize::new(1280, 720),
    ];
}
