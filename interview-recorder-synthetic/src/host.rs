use std::sync::Arc;
use std::time::Duration;

use interview_recorder_core::{
    AudioContextFactory, CaptureError, CapturePlatform, MediaDevices, MediaEncoderFactory, MediaStream, ObjectUrlRegistry,
};
use parking_lot::Mutex;

use crate::devices::{DeviceSettings, SyntheticDevices};
use crate::encoder::{EncoderSettings, SyntheticEncoderFactory};
use crate::graph::SyntheticAudioContextFactory;
use crate::object_urls::InMemoryObjectUrls;
use crate::registry::{Registry, SharedRegistry};

/// Everything the synthetic host can be told to do.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSettings {
    pub devices: DeviceSettings,
    pub encoder: EncoderSettings,
    /// Rate of every audio context the host creates.
    pub context_sample_rate: f64,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            devices: DeviceSettings::default(),
            encoder: EncoderSettings::default(),
            context_sample_rate: 48000.0,
        }
    }
}

impl HostSettings {
    pub fn validate(&self) -> Result<(), String> {
        let devices = self.devices.microphone.iter().map(|d| ("microphone", d));
        for (name, device) in devices.chain(std::iter::once(("shared tab", &self.devices.shared_tab))) {
            if !(device.sample_rate > 0.0) {
                return Err(format!("{} sample rate must be positive", name));
            }
            if device.channels == 0 {
                return Err(format!("{} must have at least one channel", name));
            }
        }
        if !(self.context_sample_rate > 0.0) {
            return Err("context sample rate must be positive".into());
        }
        if self.encoder.encodable_mime_types.is_empty() {
            return Err("encoder must accept at least one type".into());
        }
        Ok(())
    }
}

/// Deterministic in-process host implementing every capture port.
///
/// Settings can be changed between recordings through
/// [`SyntheticHost::update_devices`] and [`SyntheticHost::update_encoder`].
pub struct SyntheticHost {
    registry: SharedRegistry,
    device_settings: Arc<Mutex<DeviceSettings>>,
    encoder_settings: Arc<Mutex<EncoderSettings>>,
    devices: SyntheticDevices,
    contexts: SyntheticAudioContextFactory,
    encoders: SyntheticEncoderFactory,
    urls: InMemoryObjectUrls,
}

impl SyntheticHost {
    pub fn new(settings: HostSettings) -> Self {
        let registry = Registry::shared();
        let device_settings = Arc::new(Mutex::new(settings.devices));
        let encoder_settings = Arc::new(Mutex::new(settings.encoder));
        Self {
            devices: SyntheticDevices::new(device_settings.clone(), registry.clone()),
            contexts: SyntheticAudioContextFactory::new(registry.clone(), settings.context_sample_rate),
            encoders: SyntheticEncoderFactory::new(registry.clone(), encoder_settings.clone()),
            urls: InMemoryObjectUrls::new(),
            registry,
            device_settings,
            encoder_settings,
        }
    }

    /// Like [`SyntheticHost::new`], rejecting settings that cannot render.
    pub fn try_new(settings: HostSettings) -> Result<Self, CaptureError> {
        settings.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self::new(settings))
    }

    pub fn update_devices(&self, update: impl FnOnce(&mut DeviceSettings)) {
        update(&mut self.device_settings.lock());
    }

    pub fn update_encoder(&self, update: impl FnOnce(&mut EncoderSettings)) {
        update(&mut self.encoder_settings.lock());
    }

    /// Let `duration` of audio flow into every running encoder.
    pub fn advance(&self, duration: Duration) {
        let encoders = self.registry.lock().running_encoders();
        for encoder in encoders {
            encoder.lock().render_for(duration);
        }
    }

    /// Simulate the microphone being unplugged: every open microphone
    /// stream loses its tracks.
    pub fn unplug_microphone(&self) -> usize {
        let streams = self.open_streams();
        let stopped: usize = streams
            .iter()
            .filter(|s| s.id().starts_with("mic-"))
            .map(MediaStream::stop_all_tracks)
            .sum();
        self.device_settings.lock().microphone = None;
        log::info!("Synthetic microphone unplugged ({} tracks ended)", stopped);
        stopped
    }

    /// Capture streams handed out by the devices that still have a live track.
    pub fn open_streams(&self) -> Vec<MediaStream> {
        self.registry.lock().open_device_streams()
    }

    pub fn open_stream_count(&self) -> usize {
        self.open_streams().len()
    }

    pub fn open_context_count(&self) -> usize {
        self.registry.lock().open_context_count()
    }

    pub fn urls(&self) -> &InMemoryObjectUrls {
        &self.urls
    }
}

impl Default for SyntheticHost {
    fn default() -> Self {
        Self::new(HostSettings::default())
    }
}

impl CapturePlatform for SyntheticHost {
    fn media_devices(&self) -> &dyn MediaDevices {
        &self.devices
    }

    fn audio_contexts(&self) -> &dyn AudioContextFactory {
        &self.contexts
    }

    fn encoders(&self) -> &dyn MediaEncoderFactory {
        &self.encoders
    }

    fn object_urls(&self) -> &dyn ObjectUrlRegistry {
        &self.urls
    }
}
