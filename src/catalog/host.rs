//! Host audio system backed by cpal
//!
//! Adapts the platform audio API (WASAPI, CoreAudio, ALSA, ...) to the
//! [`AudioSystem`] contract. Capture devices map to cpal inputs; notify and
//! playback both map to cpal outputs, so the system declares the
//! notify-and-playback feature.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::catalog::{
    AudioSystem, DeviceDescriptor, DeviceRole, DeviceSystem, MediaKind,
    FEATURE_NOTIFY_AND_PLAYBACK_DEVICES,
};
use crate::error::CatalogError;

/// Audio system over the default cpal host
pub struct HostAudioSystem {
    protocol: String,
}

impl HostAudioSystem {
    pub fn new() -> Self {
        let host = cpal::default_host();
        Self {
            protocol: format!("{:?}", host.id()).to_lowercase(),
        }
    }

    /// Probe the host once; reports how many devices are visible.
    /// Enumeration failure here means the platform audio service is down.
    pub fn probe(&self) -> Result<usize, CatalogError> {
        let host = cpal::default_host();
        let inputs = host
            .input_devices()
            .map_err(|e| CatalogError::InitFailed(e.to_string()))?
            .count();
        let outputs = host
            .output_devices()
            .map_err(|e| CatalogError::InitFailed(e.to_string()))?
            .count();
        tracing::info!(
            "Host audio system '{}': {} input(s), {} output(s)",
            self.protocol,
            inputs,
            outputs
        );
        Ok(inputs + outputs)
    }

    fn descriptor(&self, name: String) -> DeviceDescriptor {
        DeviceDescriptor::new(name, self.protocol.clone(), MediaKind::Audio)
    }

    fn list(&self, input: bool) -> Vec<DeviceDescriptor> {
        let host = cpal::default_host();
        let devices = if input {
            host.input_devices()
        } else {
            host.output_devices()
        };

        match devices {
            Ok(devices) => devices
                .filter_map(|d| d.name().ok())
                .map(|name| self.descriptor(name))
                .collect(),
            Err(e) => {
                tracing::warn!("Device enumeration failed: {}", e);
                Vec::new()
            }
        }
    }

    fn default_device(&self, input: bool) -> Option<DeviceDescriptor> {
        let host = cpal::default_host();
        let device = if input {
            host.default_input_device()
        } else {
            host.default_output_device()
        };
        device
            .and_then(|d| d.name().ok())
            .map(|name| self.descriptor(name))
    }
}

impl Default for HostAudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceSystem for HostAudioSystem {
    fn locator_protocol(&self) -> &str {
        &self.protocol
    }

    fn features(&self) -> u32 {
        FEATURE_NOTIFY_AND_PLAYBACK_DEVICES
    }

    fn media_kind(&self) -> MediaKind {
        MediaKind::Audio
    }
}

impl AudioSystem for HostAudioSystem {
    fn devices(&self, role: DeviceRole) -> Vec<DeviceDescriptor> {
        match role {
            DeviceRole::Capture => self.list(true),
            DeviceRole::Notify | DeviceRole::Playback => self.list(false),
        }
    }

    fn device(&self, role: DeviceRole) -> Option<DeviceDescriptor> {
        match role {
            DeviceRole::Capture => self.default_device(true),
            DeviceRole::Notify | DeviceRole::Playback => self.default_device(false),
        }
    }
}
