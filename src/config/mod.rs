//! Device selection state and persistence
//!
//! [`DeviceConfiguration`] owns the user's device choices: the active audio
//! system, the video capture device, and the video parameters. It restores
//! them from the preference store at construction, keeps them in sync with
//! device hotplug events delivered by the host, and republishes every change
//! to its subscribers.
//!
//! Mutating methods take `&mut self` and the component does no internal
//! locking; the host is expected to deliver store and catalog notifications
//! from a single event context.

use std::collections::HashSet;
use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::catalog::{
    AudioSystem, DeviceCatalog, DeviceDescriptor, DeviceRole, MediaKind, MediaUseCase,
    VideoFormat, VideoSize, FEATURE_NOTIFY_AND_PLAYBACK_DEVICES, FEATURE_REINITIALIZE,
};
use crate::constants::{
    DEFAULT_AUDIO_DENOISE, DEFAULT_AUDIO_ECHOCANCEL, DEFAULT_AUDIO_ECHOCANCEL_FILTER_LENGTH_MS,
    DEFAULT_VIDEO_FRAMERATE, DEFAULT_VIDEO_HEIGHT, DEFAULT_VIDEO_MAX_BANDWIDTH,
    DEFAULT_VIDEO_WIDTH, NONE_PROTOCOL,
};
use crate::events::{ConfigEvent, EventBus};
use crate::store::{keys, PreferenceStore};

/// A change reported by a device system, delivered by the host through
/// [`DeviceConfiguration::handle_device_event`]
#[derive(Debug, Clone)]
pub struct DeviceEvent {
    /// Locator protocol of the reporting system
    pub source: String,
    pub change: DeviceChange,
}

/// The kind of change a device system reported
#[derive(Debug, Clone)]
pub enum DeviceChange {
    /// The system's selected device for a role changed
    Selected {
        role: DeviceRole,
        old: Option<DeviceDescriptor>,
        new: Option<DeviceDescriptor>,
    },
    /// The system's device list changed (hotplug)
    ListChanged,
}

/// User device preferences, bridged between the device catalog and the
/// preference store.
///
/// One instance per process; create it once at media-stack startup and pass
/// it to consumers.
pub struct DeviceConfiguration {
    catalog: Arc<dyn DeviceCatalog>,
    store: Arc<dyn PreferenceStore>,
    events: EventBus,

    audio_system: Option<Arc<dyn AudioSystem>>,
    video_device: Option<DeviceDescriptor>,

    // Memoized video parameters. `None` is the unset sentinel: the next
    // accessor call re-reads the store. Echo cancel, denoise and the filter
    // length are deliberately not memoized and always read live.
    frame_rate: Option<i32>,
    video_size: Option<VideoSize>,
    video_max_bandwidth: Option<u32>,

    // Locator protocols whose device events this configuration listens to:
    // the active system plus every reinitializable system.
    subscriptions: HashSet<String>,
}

impl DeviceConfiguration {
    /// Create the configuration and run the bootstrap sequence.
    ///
    /// Bootstrap is fail-soft: a catalog initialization failure is logged and
    /// the configuration comes up with nothing selected instead of failing.
    pub fn new(catalog: Arc<dyn DeviceCatalog>, store: Arc<dyn PreferenceStore>) -> Self {
        let mut config = Self {
            catalog,
            store,
            events: EventBus::new(),
            audio_system: None,
            video_device: None,
            frame_rate: None,
            video_size: None,
            video_max_bandwidth: None,
            subscriptions: HashSet::new(),
        };

        match config.catalog.initialize() {
            Ok(()) => {
                config.extract_configured_audio_system();
                config.extract_configured_video_device();
            }
            Err(e) => tracing::error!("Failed to initialize device systems: {}", e),
        }
        config.register_reinitializable_systems();

        config
    }

    /// Subscribe to configuration change events
    pub fn subscribe(&self) -> Receiver<ConfigEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    /// Restore the persisted audio system, falling back to the first
    /// available one. The derived selection is never written back.
    fn extract_configured_audio_system(&mut self) {
        tracing::info!("Looking for configured audio devices");

        let available = self.available_audio_systems();
        if available.is_empty() {
            tracing::info!("No audio systems available; audio disabled");
            return;
        }

        let persisted = self.store.get_string(keys::AUDIO_SYSTEM);
        let selected = persisted
            .and_then(|protocol| {
                available
                    .iter()
                    .find(|s| s.locator_protocol().eq_ignore_ascii_case(&protocol))
                    .cloned()
            })
            .unwrap_or_else(|| available[0].clone());

        self.set_audio_system(Some(selected), false);
    }

    /// Restore the persisted video device by scanning the format kinds in
    /// probe order. A persisted `"none"` disables video and skips the scan;
    /// a persisted name that no longer resolves falls back to the first
    /// device of the first non-empty format.
    fn extract_configured_video_device(&mut self) {
        let persisted = self.store.get_string(keys::VIDEO_DEVICE);

        if persisted
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(NONE_PROTOCOL))
        {
            self.video_device = None;
            return;
        }

        tracing::info!("Scanning for configured video devices");

        for format in VideoFormat::SCAN_ORDER {
            let devices = self.catalog.video_devices(format);
            if devices.is_empty() {
                continue;
            }

            let device = persisted
                .as_deref()
                .and_then(|name| devices.iter().find(|d| d.name == name).cloned())
                .unwrap_or_else(|| devices[0].clone());

            tracing::info!(
                "Found {} as a {:?} video capture device",
                device.name,
                format
            );
            self.video_device = Some(device);
            return;
        }

        tracing::info!("No video device was found");
    }

    /// Listen to every reinitializable device system, audio and video, so a
    /// system with zero devices at startup can announce availability later.
    fn register_reinitializable_systems(&mut self) {
        for kind in [MediaKind::Audio, MediaKind::Video] {
            for system in self.catalog.device_systems(kind) {
                if system.features() & FEATURE_REINITIALIZE != 0 {
                    self.subscriptions
                        .insert(system.locator_protocol().to_string());
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Audio system selection
    // ------------------------------------------------------------------

    /// The currently selected audio system
    pub fn audio_system(&self) -> Option<Arc<dyn AudioSystem>> {
        self.audio_system.clone()
    }

    /// Audio systems offered for selection, in catalog order.
    ///
    /// Systems without any capture device (or notify/playback device, for
    /// systems declaring that feature) are filtered out; the reserved none
    /// system is always kept. Setting the `hide-deviceless-audio-systems`
    /// preference to `false` disables the filter.
    pub fn available_audio_systems(&self) -> Vec<Arc<dyn AudioSystem>> {
        let systems = self.catalog.audio_systems();

        if systems.is_empty()
            || !self
                .store
                .get_bool(keys::HIDE_DEVICELESS_AUDIO_SYSTEMS, true)
        {
            return systems;
        }

        systems
            .into_iter()
            .filter(|system| {
                if system.is_none_system() {
                    return true;
                }
                if !system.devices(DeviceRole::Capture).is_empty() {
                    return true;
                }
                if system.features() & FEATURE_NOTIFY_AND_PLAYBACK_DEVICES == 0 {
                    return false;
                }
                !system.devices(DeviceRole::Notify).is_empty()
                    || !system.devices(DeviceRole::Playback).is_empty()
            })
            .collect()
    }

    /// Select the active audio system.
    ///
    /// Selecting the already-active system (by identity) is a no-op. The old
    /// system's event subscription is detached unless it declares
    /// [`FEATURE_REINITIALIZE`]; the switch is announced even when `persist`
    /// is false.
    pub fn set_audio_system(&mut self, system: Option<Arc<dyn AudioSystem>>, persist: bool) {
        let unchanged = match (&self.audio_system, &system) {
            (None, None) => true,
            (Some(current), Some(new)) => Arc::ptr_eq(current, new),
            _ => false,
        };
        if unchanged {
            return;
        }

        if let Some(old) = &self.audio_system {
            if old.features() & FEATURE_REINITIALIZE == 0 {
                self.subscriptions.remove(old.locator_protocol());
            }
        }

        let old_protocol = self
            .audio_system
            .as_ref()
            .map(|s| s.locator_protocol().to_string());
        self.audio_system = system;
        let new_protocol = self
            .audio_system
            .as_ref()
            .map(|s| s.locator_protocol().to_string());

        if let Some(new) = &self.audio_system {
            self.subscriptions
                .insert(new.locator_protocol().to_string());
        }

        if persist {
            match &new_protocol {
                Some(protocol) => self.store.set_string(keys::AUDIO_SYSTEM, protocol),
                None => self.store.remove(keys::AUDIO_SYSTEM),
            }
        }

        self.events.publish(ConfigEvent::AudioSystemChanged {
            old: old_protocol,
            new: new_protocol,
        });
    }

    /// The active system's capture device
    pub fn audio_capture_device(&self) -> Option<DeviceDescriptor> {
        self.audio_device(DeviceRole::Capture)
    }

    /// The active system's notification device
    pub fn audio_notify_device(&self) -> Option<DeviceDescriptor> {
        self.audio_device(DeviceRole::Notify)
    }

    /// The active system's playback device
    pub fn audio_playback_device(&self) -> Option<DeviceDescriptor> {
        self.audio_device(DeviceRole::Playback)
    }

    fn audio_device(&self, role: DeviceRole) -> Option<DeviceDescriptor> {
        self.audio_system.as_ref().and_then(|s| s.device(role))
    }

    /// Devices the active system offers for the given role
    pub fn available_audio_devices(&self, role: DeviceRole) -> Vec<DeviceDescriptor> {
        self.audio_system
            .as_ref()
            .map(|s| s.devices(role))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Video device selection
    // ------------------------------------------------------------------

    /// Select the video capture device.
    ///
    /// Selecting the current device again is a no-op. When persisting, a
    /// cleared selection writes the `"none"` sentinel so the next bootstrap
    /// keeps video disabled instead of rescanning.
    pub fn set_video_capture_device(&mut self, device: Option<DeviceDescriptor>, persist: bool) {
        if self.video_device == device {
            return;
        }

        let old = self.video_device.take();
        self.video_device = device.clone();

        if persist {
            match &self.video_device {
                Some(d) => self.store.set_string(keys::VIDEO_DEVICE, &d.name),
                None => self.store.set_string(keys::VIDEO_DEVICE, NONE_PROTOCOL),
            }
        }

        self.events
            .publish(ConfigEvent::VideoCaptureDeviceChanged { old, new: device });
    }

    /// The video device for the given use case. Desktop streaming ignores
    /// the stored selection and takes the first screen streaming device.
    pub fn video_capture_device(&self, use_case: MediaUseCase) -> Option<DeviceDescriptor> {
        match use_case {
            MediaUseCase::Any | MediaUseCase::Call => self.video_device.clone(),
            MediaUseCase::Desktop => self
                .available_video_devices(MediaUseCase::Desktop)
                .into_iter()
                .next(),
        }
    }

    /// Video devices matching the use case, deduplicated across formats
    pub fn available_video_devices(&self, use_case: MediaUseCase) -> Vec<DeviceDescriptor> {
        let mut devices: Vec<DeviceDescriptor> = Vec::new();

        for format in VideoFormat::SCAN_ORDER {
            for device in self.catalog.video_devices(format) {
                let device_use = if device.is_screen_streaming() {
                    MediaUseCase::Desktop
                } else {
                    MediaUseCase::Call
                };
                if (use_case == MediaUseCase::Any || device_use == use_case)
                    && !devices.contains(&device)
                {
                    devices.push(device);
                }
            }
        }

        devices
    }

    // ------------------------------------------------------------------
    // Video parameters (memoized)
    // ------------------------------------------------------------------

    /// Video frame rate; `-1` means unlimited
    pub fn frame_rate(&mut self) -> i32 {
        match self.frame_rate {
            Some(v) => v,
            None => {
                let v = self
                    .store
                    .get_i32(keys::VIDEO_FRAMERATE, DEFAULT_VIDEO_FRAMERATE);
                self.frame_rate = Some(v);
                v
            }
        }
    }

    pub fn set_frame_rate(&mut self, frame_rate: i32) {
        self.frame_rate = Some(frame_rate);
        if frame_rate == DEFAULT_VIDEO_FRAMERATE {
            self.store.remove(keys::VIDEO_FRAMERATE);
        } else {
            self.store.set_i32(keys::VIDEO_FRAMERATE, frame_rate);
        }
    }

    /// Video capture resolution
    pub fn video_size(&mut self) -> VideoSize {
        match self.video_size {
            Some(v) => v,
            None => {
                let width = self
                    .store
                    .get_i32(keys::VIDEO_WIDTH, DEFAULT_VIDEO_WIDTH as i32);
                let height = self
                    .store
                    .get_i32(keys::VIDEO_HEIGHT, DEFAULT_VIDEO_HEIGHT as i32);
                let size = VideoSize::new(
                    if width > 0 { width as u32 } else { DEFAULT_VIDEO_WIDTH },
                    if height > 0 { height as u32 } else { DEFAULT_VIDEO_HEIGHT },
                );
                self.video_size = Some(size);
                size
            }
        }
    }

    /// Set the capture resolution and announce it as a parameter change
    pub fn set_video_size(&mut self, size: VideoSize) {
        if size.width != DEFAULT_VIDEO_WIDTH || size.height != DEFAULT_VIDEO_HEIGHT {
            self.store.set_i32(keys::VIDEO_WIDTH, size.width as i32);
            self.store.set_i32(keys::VIDEO_HEIGHT, size.height as i32);
        } else {
            self.store.remove(keys::VIDEO_WIDTH);
            self.store.remove(keys::VIDEO_HEIGHT);
        }

        self.video_size = Some(size);
        self.events
            .publish(ConfigEvent::VideoParametersChanged { size });
    }

    /// Maximum video bandwidth in kbit/s. Non-positive stored values fall
    /// back to the default.
    pub fn video_max_bandwidth(&mut self) -> u32 {
        match self.video_max_bandwidth {
            Some(v) => v,
            None => {
                let stored = self
                    .store
                    .get_i32(keys::VIDEO_MAX_BANDWIDTH, DEFAULT_VIDEO_MAX_BANDWIDTH as i32);
                let v = if stored > 0 {
                    stored as u32
                } else {
                    DEFAULT_VIDEO_MAX_BANDWIDTH
                };
                self.video_max_bandwidth = Some(v);
                v
            }
        }
    }

    pub fn set_video_max_bandwidth(&mut self, kbps: u32) {
        self.video_max_bandwidth = Some(kbps);
        if kbps == DEFAULT_VIDEO_MAX_BANDWIDTH {
            self.store.remove(keys::VIDEO_MAX_BANDWIDTH);
        } else {
            self.store.set_i32(keys::VIDEO_MAX_BANDWIDTH, kbps as i32);
        }
    }

    // ------------------------------------------------------------------
    // Audio processing toggles (always read live)
    // ------------------------------------------------------------------

    /// Whether echo cancellation is performed on captured audio
    pub fn echo_cancel(&self) -> bool {
        self.store
            .get_bool(keys::AUDIO_ECHOCANCEL, DEFAULT_AUDIO_ECHOCANCEL)
    }

    pub fn set_echo_cancel(&self, enabled: bool) {
        if enabled == DEFAULT_AUDIO_ECHOCANCEL {
            self.store.remove(keys::AUDIO_ECHOCANCEL);
        } else {
            self.store.set_bool(keys::AUDIO_ECHOCANCEL, enabled);
        }
    }

    /// Echo cancellation filter length in milliseconds
    pub fn echo_cancel_filter_length_ms(&self) -> i64 {
        self.store.get_i64(
            keys::AUDIO_ECHOCANCEL_FILTER_LENGTH_MS,
            DEFAULT_AUDIO_ECHOCANCEL_FILTER_LENGTH_MS,
        )
    }

    pub fn set_echo_cancel_filter_length_ms(&self, millis: i64) {
        if millis == DEFAULT_AUDIO_ECHOCANCEL_FILTER_LENGTH_MS {
            self.store.remove(keys::AUDIO_ECHOCANCEL_FILTER_LENGTH_MS);
        } else {
            self.store
                .set_i64(keys::AUDIO_ECHOCANCEL_FILTER_LENGTH_MS, millis);
        }
    }

    /// Whether noise suppression is performed on captured audio
    pub fn denoise(&self) -> bool {
        self.store.get_bool(keys::AUDIO_DENOISE, DEFAULT_AUDIO_DENOISE)
    }

    pub fn set_denoise(&self, enabled: bool) {
        if enabled == DEFAULT_AUDIO_DENOISE {
            self.store.remove(keys::AUDIO_DENOISE);
        } else {
            self.store.set_bool(keys::AUDIO_DENOISE, enabled);
        }
    }

    // ------------------------------------------------------------------
    // Incoming notifications
    // ------------------------------------------------------------------

    /// Handle a device change reported by a device system.
    ///
    /// Events from systems outside the subscription set are ignored. Device
    /// changes run the none-system promotion first, then are re-emitted only
    /// when they concern the active system; list changes from an audio
    /// system re-emit as [`ConfigEvent::AudioSystemDevicesChanged`]. Nothing
    /// here fails; unrecognized events are dropped.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        if !self.subscriptions.contains(&event.source) {
            tracing::debug!("Ignoring device event from unsubscribed '{}'", event.source);
            return;
        }

        match event.change {
            DeviceChange::Selected { role, old, new } => {
                if let Some(new_device) = &new {
                    self.promote_from_none(new_device);
                }

                let concerned = old.as_ref().or(new.as_ref());
                let emit = match (concerned, &self.audio_system) {
                    (None, _) => true,
                    (Some(device), Some(active)) => device
                        .protocol
                        .eq_ignore_ascii_case(active.locator_protocol()),
                    (Some(_), None) => false,
                };

                if emit {
                    self.events
                        .publish(ConfigEvent::AudioDeviceChanged { role, old, new });
                }
            }
            DeviceChange::ListChanged => {
                if self.catalog.audio_system(&event.source).is_some() {
                    self.events.publish(ConfigEvent::AudioSystemDevicesChanged);
                }
            }
        }
    }

    /// `NoneActive -> BackendActive` transition: when the none system is
    /// active and a device appears on a real backend, switch to that backend
    /// without persisting. Returns whether the switch happened.
    fn promote_from_none(&mut self, candidate: &DeviceDescriptor) -> bool {
        let none_active = self
            .audio_system
            .as_ref()
            .is_some_and(|s| s.is_none_system());
        if !none_active || candidate.protocol.eq_ignore_ascii_case(NONE_PROTOCOL) {
            return false;
        }

        match self.catalog.audio_system(&candidate.protocol) {
            Some(system) => {
                tracing::info!(
                    "Audio device available on '{}', leaving the none system",
                    candidate.protocol
                );
                self.set_audio_system(Some(system), false);
                true
            }
            None => false,
        }
    }

    /// Handle an external change of a stored preference key.
    ///
    /// Invalidates the matching memo so the next accessor call re-reads the
    /// store; other keys are ignored.
    pub fn handle_preference_change(&mut self, key: &str) {
        match key {
            keys::VIDEO_FRAMERATE => self.frame_rate = None,
            keys::VIDEO_WIDTH | keys::VIDEO_HEIGHT => self.video_size = None,
            keys::VIDEO_MAX_BANDWIDTH => self.video_max_bandwidth = None,
            _ => {}
        }
    }

    /// Store keys whose external changes should be forwarded to
    /// [`Self::handle_preference_change`]
    pub fn watched_preference_keys() -> [&'static str; 4] {
        [
            keys::VIDEO_FRAMERATE,
            keys::VIDEO_WIDTH,
            keys::VIDEO_HEIGHT,
            keys::VIDEO_MAX_BANDWIDTH,
        ]
    }
}
