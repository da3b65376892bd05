//! Fixed in-memory device catalog
//!
//! A catalog whose systems and device lists are plain data, mutable at
//! runtime to simulate hotplug. Used by tests and by embedders that drive
//! device discovery themselves.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{
    AudioSystem, DeviceCatalog, DeviceDescriptor, DeviceRole, DeviceSystem, MediaKind,
    NoneAudioSystem, VideoFormat,
};
use crate::error::CatalogError;

/// An audio system with in-memory device lists
pub struct FixedAudioSystem {
    protocol: String,
    features: u32,
    devices: RwLock<HashMap<DeviceRole, Vec<DeviceDescriptor>>>,
    selected: RwLock<HashMap<DeviceRole, DeviceDescriptor>>,
}

impl FixedAudioSystem {
    pub fn new(protocol: impl Into<String>, features: u32) -> Arc<Self> {
        Arc::new(Self {
            protocol: protocol.into(),
            features,
            devices: RwLock::new(HashMap::new()),
            selected: RwLock::new(HashMap::new()),
        })
    }

    /// Add a device under the given role. The first device added for a role
    /// becomes the selected one.
    pub fn add_device(&self, role: DeviceRole, name: impl Into<String>) -> DeviceDescriptor {
        let descriptor = DeviceDescriptor::new(name, self.protocol.clone(), MediaKind::Audio);
        self.devices
            .write()
            .entry(role)
            .or_default()
            .push(descriptor.clone());
        self.selected
            .write()
            .entry(role)
            .or_insert_with(|| descriptor.clone());
        descriptor
    }

    /// Replace the selected device for a role
    pub fn select_device(&self, role: DeviceRole, descriptor: DeviceDescriptor) {
        self.selected.write().insert(role, descriptor);
    }

    /// Remove every device of a role
    pub fn clear_devices(&self, role: DeviceRole) {
        self.devices.write().remove(&role);
        self.selected.write().remove(&role);
    }
}

impl DeviceSystem for FixedAudioSystem {
    fn locator_protocol(&self) -> &str {
        &self.protocol
    }

    fn features(&self) -> u32 {
        self.features
    }

    fn media_kind(&self) -> MediaKind {
        MediaKind::Audio
    }
}

impl AudioSystem for FixedAudioSystem {
    fn devices(&self, role: DeviceRole) -> Vec<DeviceDescriptor> {
        self.devices.read().get(&role).cloned().unwrap_or_default()
    }

    fn device(&self, role: DeviceRole) -> Option<DeviceDescriptor> {
        self.selected.read().get(&role).cloned()
    }
}

/// A video device system without enumerable devices of its own, used to
/// register reinitializable video backends with the catalog
pub struct FixedVideoSystem {
    protocol: String,
    features: u32,
}

impl FixedVideoSystem {
    pub fn new(protocol: impl Into<String>, features: u32) -> Arc<Self> {
        Arc::new(Self {
            protocol: protocol.into(),
            features,
        })
    }
}

impl DeviceSystem for FixedVideoSystem {
    fn locator_protocol(&self) -> &str {
        &self.protocol
    }

    fn features(&self) -> u32 {
        self.features
    }

    fn media_kind(&self) -> MediaKind {
        MediaKind::Video
    }
}

/// In-memory catalog. Seeds the reserved none system on construction.
pub struct FixedCatalog {
    audio_systems: RwLock<Vec<Arc<dyn AudioSystem>>>,
    // Same audio systems, kept separately under the device-system view
    audio_device_systems: RwLock<Vec<Arc<dyn DeviceSystem>>>,
    video_systems: RwLock<Vec<Arc<dyn DeviceSystem>>>,
    video_devices: RwLock<HashMap<VideoFormat, Vec<DeviceDescriptor>>>,
}

impl FixedCatalog {
    pub fn new() -> Self {
        let none = Arc::new(NoneAudioSystem);
        Self {
            audio_systems: RwLock::new(vec![none.clone()]),
            audio_device_systems: RwLock::new(vec![none]),
            video_systems: RwLock::new(Vec::new()),
            video_devices: RwLock::new(HashMap::new()),
        }
    }

    /// Register an audio system; catalog order is registration order
    pub fn add_audio_system<S: AudioSystem + 'static>(&self, system: Arc<S>) {
        self.audio_systems.write().push(system.clone());
        self.audio_device_systems.write().push(system);
    }

    /// Register a video device system
    pub fn add_video_system(&self, system: Arc<dyn DeviceSystem>) {
        self.video_systems.write().push(system);
    }

    /// Register a video capture device under the given format
    pub fn add_video_device(&self, format: VideoFormat, descriptor: DeviceDescriptor) {
        self.video_devices
            .write()
            .entry(format)
            .or_default()
            .push(descriptor);
    }
}

impl Default for FixedCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog for FixedCatalog {
    fn initialize(&self) -> Result<(), CatalogError> {
        Ok(())
    }

    fn audio_systems(&self) -> Vec<Arc<dyn AudioSystem>> {
        self.audio_systems.read().clone()
    }

    fn device_systems(&self, kind: MediaKind) -> Vec<Arc<dyn DeviceSystem>> {
        match kind {
            MediaKind::Audio => self.audio_device_systems.read().clone(),
            MediaKind::Video => self.video_systems.read().clone(),
        }
    }

    fn video_devices(&self, format: VideoFormat) -> Vec<DeviceDescriptor> {
        self.video_devices
            .read()
            .get(&format)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_seeds_none_system() {
        let catalog = FixedCatalog::new();
        let systems = catalog.audio_systems();
        assert_eq!(systems.len(), 1);
        assert!(systems[0].is_none_system());
    }

    #[test]
    fn lookup_by_protocol_is_case_insensitive() {
        let catalog = FixedCatalog::new();
        catalog.add_audio_system(FixedAudioSystem::new("PulseAudio", 0));

        assert!(catalog.audio_system("pulseaudio").is_some());
        assert!(catalog.audio_system("missing").is_none());
    }

    #[test]
    fn first_added_device_is_selected() {
        let system = FixedAudioSystem::new("alsa", 0);
        let first = system.add_device(DeviceRole::Capture, "Mic A");
        system.add_device(DeviceRole::Capture, "Mic B");

        assert_eq!(system.device(DeviceRole::Capture), Some(first));
        assert_eq!(system.devices(DeviceRole::Capture).len(), 2);
    }

    #[test]
    fn video_devices_grouped_by_format() {
        let catalog = FixedCatalog::new();
        let cam = DeviceDescriptor::new("Cam1", "v4l2", MediaKind::Video);
        catalog.add_video_device(VideoFormat::H264, cam.clone());

        assert!(catalog.video_devices(VideoFormat::RawFrame).is_empty());
        assert_eq!(catalog.video_devices(VideoFormat::H264), vec![cam]);
    }
}
