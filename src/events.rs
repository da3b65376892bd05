//! Change notifications published by the device configuration

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::catalog::{DeviceDescriptor, DeviceRole, VideoSize};

/// A change in the device configuration, delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// The active audio system's device for a role changed
    AudioDeviceChanged {
        role: DeviceRole,
        old: Option<DeviceDescriptor>,
        new: Option<DeviceDescriptor>,
    },

    /// A different audio system became active; values are locator protocols
    AudioSystemChanged {
        old: Option<String>,
        new: Option<String>,
    },

    /// The active audio system's device list changed (hotplug)
    AudioSystemDevicesChanged,

    /// The selected video capture device changed
    VideoCaptureDeviceChanged {
        old: Option<DeviceDescriptor>,
        new: Option<DeviceDescriptor>,
    },

    /// Video parameters (resolution) changed without a device swap
    VideoParametersChanged { size: VideoSize },
}

/// Fan-out of [`ConfigEvent`]s to any number of channel subscribers.
///
/// Publishing never blocks; subscribers whose receiver was dropped are pruned
/// on the next publish.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<ConfigEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> Receiver<ConfigEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber
    pub fn publish(&self, event: ConfigEvent) {
        tracing::debug!("Publishing {:?}", event);
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers (stale ones counted until next publish)
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
