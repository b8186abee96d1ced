//! Chunked PCM16 WAV encoder.
//!
//! Audio is pulled from the registry either by [`crate::SyntheticHost::advance`]
//! or, in realtime mode with a timeslice, by a background thread. Without a
//! timeslice everything is held until stop and delivered as one chunk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use interview_recorder_core::processing::channel_merger::convert_to_int16_pcm;
use interview_recorder_core::{
    CaptureError, EncoderEventSink, EncoderOptions, MediaEncoder, MediaEncoderFactory, MediaStream, MimeType,
};
use parking_lot::Mutex;

use crate::registry::SharedRegistry;
use crate::wav::{finalize_sizes, wav_header, PcmFormat};

/// The only container the synthetic encoder can write.
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// What the encoder factory claims and what it can actually produce.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    /// Answers to `is_type_supported`.
    pub advertised_mime_types: Vec<MimeType>,
    /// Types accepted at construction time. Anything else is rejected.
    pub encodable_mime_types: Vec<MimeType>,
    /// Drive chunking from a background thread at the timeslice interval.
    pub realtime: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        let wav = vec![MimeType::new(WAV_MIME_TYPE)];
        Self {
            advertised_mime_types: wav.clone(),
            encodable_mime_types: wav,
            realtime: false,
        }
    }
}

pub(crate) struct EncoderCore {
    stream_id: String,
    sample_rate: f64,
    channels: u16,
    chunk_per_render: bool,
    sink: Option<EncoderEventSink>,
    header_written: bool,
    /// Whether any chunk has gone out yet.
    emitted: bool,
    pending: Vec<u8>,
    registry: SharedRegistry,
}

impl EncoderCore {
    /// Pull `duration` worth of audio from the recorded stream.
    pub(crate) fn render_for(&mut self, duration: Duration) {
        let frames = (self.sample_rate * duration.as_secs_f64()).round() as usize;
        self.render(frames);
    }

    fn render(&mut self, frames: usize) {
        if self.sink.is_none() || frames == 0 {
            return;
        }

        let rendered = {
            let mut registry = self.registry.lock();
            match registry.stream(&self.stream_id) {
                Some(stream) if stream.is_active() => registry.render(&self.stream_id, frames),
                _ => None,
            }
        };

        let Some(samples) = rendered else {
            self.fail("recorded stream ended");
            return;
        };

        self.write_header_once();
        self.pending.extend_from_slice(&convert_to_int16_pcm(&samples));
        if self.chunk_per_render {
            self.flush();
        }
    }

    fn write_header_once(&mut self) {
        if !self.header_written {
            let format = PcmFormat::pcm16(self.sample_rate as u32, self.channels);
            let header = wav_header(format, None);
            self.pending.extend_from_slice(&header);
            self.header_written = true;
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.data_available(std::mem::take(&mut self.pending));
            self.emitted = true;
        }
    }

    fn finish(&mut self) {
        if self.sink.is_none() {
            return;
        }
        self.write_header_once();
        if !self.emitted {
            // The whole file is still in hand, so its sizes are known.
            finalize_sizes(&mut self.pending);
        }
        self.flush();
        if let Some(sink) = self.sink.take() {
            sink.stopped();
        }
        log::debug!("Synthetic encoder for {} finished", self.stream_id);
    }

    fn fail(&mut self, message: &str) {
        if let Some(sink) = self.sink.take() {
            log::warn!("Synthetic encoder for {} failed: {}", self.stream_id, message);
            self.pending.clear();
            sink.error(message);
        }
    }
}

pub struct SyntheticEncoderFactory {
    registry: SharedRegistry,
    settings: Arc<Mutex<EncoderSettings>>,
}

impl SyntheticEncoderFactory {
    pub(crate) fn new(registry: SharedRegistry, settings: Arc<Mutex<EncoderSettings>>) -> Self {
        Self { registry, settings }
    }
}

impl MediaEncoderFactory for SyntheticEncoderFactory {
    fn is_type_supported(&self, mime_type: &MimeType) -> bool {
        self.settings.lock().advertised_mime_types.contains(mime_type)
    }

    fn create(&self, stream: &MediaStream, options: &EncoderOptions) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        let settings = self.settings.lock().clone();
        if let Some(requested) = &options.mime_type {
            if !settings.encodable_mime_types.contains(requested) {
                return Err(CaptureError::EncodingFailed(format!(
                    "cannot encode {} with the synthetic encoder",
                    requested
                )));
            }
        }

        let (sample_rate, channels) = self
            .registry
            .lock()
            .format_of(stream.id())
            .ok_or_else(|| CaptureError::EncodingFailed(format!("unknown stream {}", stream.id())))?;

        let core = EncoderCore {
            stream_id: stream.id().to_string(),
            sample_rate,
            channels,
            chunk_per_render: options.timeslice.is_some(),
            sink: None,
            header_written: false,
            emitted: false,
            pending: Vec::new(),
            registry: self.registry.clone(),
        };

        log::debug!(
            "Synthetic encoder created for {} ({} Hz, {} ch, timeslice {:?})",
            stream.id(),
            sample_rate,
            channels,
            options.timeslice
        );

        Ok(Box::new(SyntheticEncoder {
            core: Arc::new(Mutex::new(core)),
            mime_type: MimeType::new(WAV_MIME_TYPE),
            timeslice: options.timeslice.filter(|_| settings.realtime),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }))
    }
}

pub struct SyntheticEncoder {
    core: Arc<Mutex<EncoderCore>>,
    mime_type: MimeType,
    /// Set only in realtime mode.
    timeslice: Option<Duration>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticEncoder {
    fn stop_worker(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("Synthetic encoder worker panicked");
            }
        }
    }
}

impl MediaEncoder for SyntheticEncoder {
    fn mime_type(&self) -> Option<MimeType> {
        Some(self.mime_type.clone())
    }

    fn start(&mut self, sink: EncoderEventSink) -> Result<(), CaptureError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::InvalidState("encoder already started".into()));
        }

        let registry = {
            let mut core = self.core.lock();
            core.sink = Some(sink);
            core.registry.clone()
        };
        registry.lock().add_encoder(Arc::downgrade(&self.core));

        if let Some(timeslice) = self.timeslice {
            let core = Arc::clone(&self.core);
            let running = Arc::clone(&self.running);
            let handle = std::thread::Builder::new()
                .name("synthetic-encoder".into())
                .spawn(move || {
                    while running.load(Ordering::SeqCst) {
                        std::thread::sleep(timeslice);
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        core.lock().render_for(timeslice);
                    }
                })
                .map_err(|e| CaptureError::EncodingFailed(format!("failed to spawn encoder thread: {}", e)))?;
            self.worker = Some(handle);
        }
        Ok(())
    }

    fn request_stop(&mut self) -> Result<(), CaptureError> {
        self.stop_worker();
        self.core.lock().finish();
        Ok(())
    }
}

impl Drop for SyntheticEncoder {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceSettings, SyntheticDevices};
    use crate::registry::{Registry, ToneDevice};
    use crate::signal::Signal;
    use crate::wav::{decode_pcm16, STREAMING_SIZE};
    use interview_recorder_core::{EncoderEvent, MediaDevices, MediaTrack};
    use std::sync::mpsc;

    struct Rig {
        devices: SyntheticDevices,
        factory: SyntheticEncoderFactory,
        registry: SharedRegistry,
    }

    fn rig(settings: EncoderSettings) -> Rig {
        let registry = Registry::shared();
        let devices = DeviceSettings {
            microphone: Some(ToneDevice::new(Signal::Constant(0.5), 8000.0, 1)),
            ..Default::default()
        };
        Rig {
            devices: SyntheticDevices::new(Arc::new(Mutex::new(devices)), registry.clone()),
            factory: SyntheticEncoderFactory::new(registry.clone(), Arc::new(Mutex::new(settings))),
            registry,
        }
    }

    fn advance(registry: &SharedRegistry, duration: Duration) {
        let encoders = registry.lock().running_encoders();
        for encoder in encoders {
            encoder.lock().render_for(duration);
        }
    }

    fn data_size(payload: &[u8]) -> u32 {
        u32::from_le_bytes([payload[40], payload[41], payload[42], payload[43]])
    }

    fn riff_size(payload: &[u8]) -> u32 {
        u32::from_le_bytes([payload[4], payload[5], payload[6], payload[7]])
    }

    fn drain(rx: &mpsc::Receiver<EncoderEvent>) -> Vec<EncoderEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn without_timeslice_delivers_one_chunk_at_stop() {
        let rig = rig(EncoderSettings::default());
        let mic = rig.devices.request_microphone().unwrap();
        let mut encoder = rig.factory.create(&mic, &EncoderOptions::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        encoder.start(EncoderEventSink::new(tx)).unwrap();

        advance(&rig.registry, Duration::from_millis(10));
        advance(&rig.registry, Duration::from_millis(10));
        assert!(drain(&rx).is_empty());

        encoder.request_stop().unwrap();
        let events = drain(&rx);

        assert_eq!(events.len(), 2);
        let EncoderEvent::DataAvailable(payload) = &events[0] else {
            panic!("expected data, got {:?}", events[0]);
        };
        assert_eq!(events[1], EncoderEvent::Stopped);
        let wav = decode_pcm16(payload).unwrap();
        assert_eq!(wav.sample_rate, 8000);
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.frame_count(), 160);
        assert_eq!(data_size(payload), 160 * 2);
        assert_eq!(riff_size(payload), 36 + 160 * 2);
    }

    #[test]
    fn timeslice_emits_a_chunk_per_advance() {
        let rig = rig(EncoderSettings::default());
        let mic = rig.devices.request_microphone().unwrap();
        let options = EncoderOptions {
            mime_type: None,
            timeslice: Some(Duration::from_millis(100)),
        };
        let mut encoder = rig.factory.create(&mic, &options).unwrap();
        let (tx, rx) = mpsc::channel();
        encoder.start(EncoderEventSink::new(tx)).unwrap();

        advance(&rig.registry, Duration::from_millis(100));
        advance(&rig.registry, Duration::from_millis(100));
        encoder.request_stop().unwrap();
        let events = drain(&rx);

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], EncoderEvent::DataAvailable(d) if d.len() == 44 + 800 * 2));
        assert!(matches!(&events[1], EncoderEvent::DataAvailable(d) if d.len() == 800 * 2));
        assert_eq!(events[2], EncoderEvent::Stopped);
        let EncoderEvent::DataAvailable(first) = &events[0] else {
            panic!("expected data");
        };
        assert_eq!(data_size(first), STREAMING_SIZE);
    }

    #[test]
    fn stop_without_audio_yields_header_only_payload() {
        let rig = rig(EncoderSettings::default());
        let mic = rig.devices.request_microphone().unwrap();
        let mut encoder = rig.factory.create(&mic, &EncoderOptions::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        encoder.start(EncoderEventSink::new(tx)).unwrap();

        encoder.request_stop().unwrap();
        encoder.request_stop().unwrap();

        let events = drain(&rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], EncoderEvent::DataAvailable(d) if d.len() == 44 && data_size(d) == 0));
    }

    #[test]
    fn ended_stream_reports_error() {
        let rig = rig(EncoderSettings::default());
        let mic = rig.devices.request_microphone().unwrap();
        let mut encoder = rig.factory.create(&mic, &EncoderOptions::default()).unwrap();
        let (tx, rx) = mpsc::channel();
        encoder.start(EncoderEventSink::new(tx)).unwrap();

        mic.tracks()[0].stop();
        advance(&rig.registry, Duration::from_millis(10));

        let events = drain(&rx);
        assert!(matches!(events.as_slice(), [EncoderEvent::Error(_)]));
        encoder.request_stop().unwrap();
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn advertised_but_unencodable_type_fails_construction() {
        let rig = rig(EncoderSettings {
            advertised_mime_types: vec![MimeType::new("audio/webm")],
            ..Default::default()
        });
        let mic = rig.devices.request_microphone().unwrap();

        assert!(rig.factory.is_type_supported(&MimeType::new("audio/webm")));
        let options = EncoderOptions {
            mime_type: Some(MimeType::new("audio/webm")),
            timeslice: None,
        };
        assert!(matches!(
            rig.factory.create(&mic, &options),
            Err(CaptureError::EncodingFailed(_))
        ));
        assert!(rig.factory.create(&mic, &EncoderOptions::default()).is_ok());
    }

    #[test]
    fn realtime_worker_emits_chunks() {
        let rig = rig(EncoderSettings {
            realtime: true,
            ..Default::default()
        });
        let mic = rig.devices.request_microphone().unwrap();
        let options = EncoderOptions {
            mime_type: None,
            timeslice: Some(Duration::from_millis(5)),
        };
        let mut encoder = rig.factory.create(&mic, &options).unwrap();
        let (tx, rx) = mpsc::channel();
        encoder.start(EncoderEventSink::new(tx)).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, EncoderEvent::DataAvailable(_)));

        encoder.request_stop().unwrap();
        let rest = drain(&rx);
        assert_eq!(rest.last(), Some(&EncoderEvent::Stopped));
    }
}
