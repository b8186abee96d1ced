use std::sync::Arc;

use interview_recorder_core::models::error::{CaptureDevice, CaptureError};
use interview_recorder_core::{DisplayMediaOptions, MediaDevices, MediaStream, MediaTrack, TrackKind};
use parking_lot::Mutex;

use crate::registry::{SharedRegistry, SourceKind, ToneDevice};
use crate::signal::Signal;
use crate::track::SyntheticTrack;

/// What the simulated user and hardware do when asked for media.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSettings {
    /// `None` means no microphone is attached.
    pub microphone: Option<ToneDevice>,
    pub shared_tab: ToneDevice,
    pub microphone_permission: bool,
    pub display_permission: bool,
    /// Whether the user ticks "share tab audio" in the picker.
    pub share_tab_audio: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            microphone: Some(ToneDevice::new(Signal::sine(440.0, 0.5), 48000.0, 1)),
            shared_tab: ToneDevice::new(Signal::sine(1000.0, 0.3), 48000.0, 2),
            microphone_permission: true,
            display_permission: true,
            share_tab_audio: true,
        }
    }
}

/// Microphone and display-share devices backed by tone generators.
pub struct SyntheticDevices {
    settings: Arc<Mutex<DeviceSettings>>,
    registry: SharedRegistry,
}

impl SyntheticDevices {
    pub(crate) fn new(settings: Arc<Mutex<DeviceSettings>>, registry: SharedRegistry) -> Self {
        Self { settings, registry }
    }

    fn track(&self, prefix: &str, kind: TrackKind) -> Arc<dyn MediaTrack> {
        let id = self.registry.lock().next_id(prefix);
        Arc::new(SyntheticTrack::new(id, kind))
    }
}

impl MediaDevices for SyntheticDevices {
    fn request_microphone(&self) -> Result<MediaStream, CaptureError> {
        let settings = self.settings.lock().clone();
        if !settings.microphone_permission {
            return Err(CaptureError::PermissionDenied(CaptureDevice::Microphone));
        }
        let device = settings
            .microphone
            .ok_or(CaptureError::DeviceNotAvailable(CaptureDevice::Microphone))?;

        let track = self.track("mic-track", TrackKind::Audio);
        let mut registry = self.registry.lock();
        let stream = MediaStream::new(registry.next_id("mic"), vec![track]);
        registry.add_device_stream(stream.clone(), SourceKind::Device(device));
        log::info!("Synthetic microphone opened: {} ({} Hz)", stream.id(), device.sample_rate);
        Ok(stream)
    }

    fn request_display(&self, options: DisplayMediaOptions) -> Result<MediaStream, CaptureError> {
        let settings = self.settings.lock().clone();
        if !settings.display_permission {
            return Err(CaptureError::PermissionDenied(CaptureDevice::DisplayShare));
        }

        let with_audio = options.audio && settings.share_tab_audio;
        let mut tracks = Vec::new();
        if options.video {
            tracks.push(self.track("tab-video", TrackKind::Video));
        }
        if with_audio {
            tracks.push(self.track("tab-audio", TrackKind::Audio));
        }
        if tracks.is_empty() {
            return Err(CaptureError::DeviceNotAvailable(CaptureDevice::DisplayShare));
        }

        let kind = if with_audio {
            SourceKind::Device(settings.shared_tab)
        } else {
            SourceKind::Silent {
                sample_rate: settings.shared_tab.sample_rate,
            }
        };

        let mut registry = self.registry.lock();
        let stream = MediaStream::new(registry.next_id("tab"), tracks);
        registry.add_device_stream(stream.clone(), kind);
        log::info!("Synthetic tab share opened: {} (audio: {})", stream.id(), with_audio);
        Ok(stream)
    }
}
