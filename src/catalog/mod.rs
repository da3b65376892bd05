//! Device catalog contract
//!
//! The catalog enumerates pluggable device systems (audio backends, video
//! capture backends) and the devices they expose. The configuration layer
//! never talks to hardware directly; it goes through these traits, so hosts
//! can plug in platform backends or the fixed in-memory catalog.

pub mod fixed;
pub mod host;

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::NONE_PROTOCOL;
use crate::error::CatalogError;

/// Media kind handled by a device system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Audio,
    Video,
}

/// Role a device plays within an audio system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    /// Microphone input
    Capture,
    /// Incoming-call / message notification output
    Notify,
    /// Call audio output
    Playback,
}

/// Intended use of a video capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaUseCase {
    Any,
    /// Regular camera call
    Call,
    /// Screen/desktop streaming
    Desktop,
}

/// Video capture format kinds, in the order the bootstrap scan probes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoFormat {
    RawFrame,
    Rgb,
    Yuv,
    H264,
}

impl VideoFormat {
    /// Probe order for the configured-device scan; the first format that
    /// yields any device wins.
    pub const SCAN_ORDER: [VideoFormat; 4] = [
        VideoFormat::RawFrame,
        VideoFormat::Rgb,
        VideoFormat::Yuv,
        VideoFormat::H264,
    ];
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for VideoSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Identity of a capture/playback device as reported by a device system.
///
/// Equality and hashing consider only `name` and `protocol`; the same physical
/// device listed for different roles compares equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Human-readable device name, also the persisted identity
    pub name: String,
    /// Locator protocol of the owning device system
    pub protocol: String,
    /// Media kind of the device
    pub kind: MediaKind,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, protocol: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            kind,
        }
    }

    /// Whether this device belongs to the screen streaming backend
    pub fn is_screen_streaming(&self) -> bool {
        self.protocol
            .eq_ignore_ascii_case(crate::constants::IMGSTREAMING_PROTOCOL)
    }
}

impl PartialEq for DeviceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.protocol == other.protocol
    }
}

impl Eq for DeviceDescriptor {}

impl Hash for DeviceDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.protocol.hash(state);
    }
}

/// Feature flag: the system can re-enumerate its devices at runtime and
/// announce devices that appear after startup
pub const FEATURE_REINITIALIZE: u32 = 1 << 0;

/// Feature flag: the system distinguishes notify and playback outputs
pub const FEATURE_NOTIFY_AND_PLAYBACK_DEVICES: u32 = 1 << 1;

/// A pluggable source of devices (audio backend or video capture backend)
pub trait DeviceSystem: Send + Sync {
    /// Stable identifier for the system, also the persisted identity
    fn locator_protocol(&self) -> &str;

    /// Feature bitmask ([`FEATURE_REINITIALIZE`], ...)
    fn features(&self) -> u32 {
        0
    }

    /// Media kind this system provides devices for
    fn media_kind(&self) -> MediaKind;
}

/// An audio backend exposing capture/notify/playback device lists
pub trait AudioSystem: DeviceSystem {
    /// All devices available for the given role
    fn devices(&self, role: DeviceRole) -> Vec<DeviceDescriptor>;

    /// The system's currently selected device for the given role
    fn device(&self, role: DeviceRole) -> Option<DeviceDescriptor>;

    /// Whether this is the reserved "no audio device" system
    fn is_none_system(&self) -> bool {
        self.locator_protocol().eq_ignore_ascii_case(NONE_PROTOCOL)
    }
}

/// Enumerator of device systems and video capture devices
pub trait DeviceCatalog: Send + Sync {
    /// Initialize the underlying backends. Called once during bootstrap;
    /// failures leave the configuration in a valid-but-empty state.
    fn initialize(&self) -> Result<(), CatalogError>;

    /// All registered audio systems, in catalog order
    fn audio_systems(&self) -> Vec<Arc<dyn AudioSystem>>;

    /// Look up an audio system by locator protocol (case-insensitive)
    fn audio_system(&self, protocol: &str) -> Option<Arc<dyn AudioSystem>> {
        self.audio_systems()
            .into_iter()
            .find(|s| s.locator_protocol().eq_ignore_ascii_case(protocol))
    }

    /// All device systems of the given media kind, in catalog order
    fn device_systems(&self, kind: MediaKind) -> Vec<Arc<dyn DeviceSystem>>;

    /// Video capture devices supporting the given format
    fn video_devices(&self, format: VideoFormat) -> Vec<DeviceDescriptor>;
}

/// The reserved audio system representing "no audio device selected".
///
/// Always present in a catalog, never filtered out by the deviceless-system
/// filter, and reports no devices.
#[derive(Debug, Default)]
pub struct NoneAudioSystem;

impl DeviceSystem for NoneAudioSystem {
    fn locator_protocol(&self) -> &str {
        NONE_PROTOCOL
    }

    fn media_kind(&self) -> MediaKind {
        MediaKind::Audio
    }
}

impl AudioSystem for NoneAudioSystem {
    fn devices(&self, _role: DeviceRole) -> Vec<DeviceDescriptor> {
        Vec::new()
    }

    fn device(&self, _role: DeviceRole) -> Option<DeviceDescriptor> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_equality_ignores_kind() {
        let a = DeviceDescriptor::new("Cam1", "v4l2", MediaKind::Video);
        let b = DeviceDescriptor::new("Cam1", "v4l2", MediaKind::Audio);
        let c = DeviceDescriptor::new("Cam1", "other", MediaKind::Video);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn none_system_has_no_devices() {
        let none = NoneAudioSystem;
        assert!(none.is_none_system());
        assert!(none.devices(DeviceRole::Capture).is_empty());
        assert!(none.device(DeviceRole::Playback).is_none());
        assert_eq!(none.features(), 0);
    }

    #[test]
    fn screen_streaming_detection() {
        let screen = DeviceDescriptor::new("Screen 1", "imgstreaming", MediaKind::Video);
        let cam = DeviceDescriptor::new("Cam1", "v4l2", MediaKind::Video);
        assert!(screen.is_screen_streaming());
        assert!(!cam.is_screen_streaming());
    }
}
