//! Scriptable host fakes shared by the session tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::artifact::Blob;
use crate::models::encoding::MimeType;
use crate::models::error::{CaptureDevice, CaptureError};
use crate::models::media_stream::MediaStream;
use crate::traits::audio_graph::{AudioContext, AudioContextFactory, AudioNode, AudioNodeKind};
use crate::traits::media_devices::{DisplayMediaOptions, MediaDevices};
use crate::traits::media_encoder::{EncoderEventSink, EncoderOptions, MediaEncoder, MediaEncoderFactory};
use crate::traits::media_track::{MediaTrack, TrackKind};
use crate::traits::object_urls::ObjectUrlRegistry;
use crate::traits::platform::CapturePlatform;

pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    live: AtomicBool,
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

fn fake_stream(id: String, kinds: &[TrackKind]) -> MediaStream {
    let tracks = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            Arc::new(FakeTrack {
                id: format!("{}-t{}", id, i),
                kind: *kind,
                live: AtomicBool::new(true),
            }) as Arc<dyn MediaTrack>
        })
        .collect();
    MediaStream::new(id, tracks)
}

#[derive(Default)]
pub struct FakeDevices {
    pub deny_microphone: bool,
    pub deny_display: bool,
    pub no_microphone: bool,
    pub tab_without_audio: bool,
    pub opened: Mutex<Vec<MediaStream>>,
    pub counter: AtomicUsize,
}

impl FakeDevices {
    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst))
    }

    /// Streams handed out so far that still have a live track.
    pub fn live_streams(&self) -> usize {
        self.opened.lock().iter().filter(|s| s.is_active()).count()
    }
}

impl MediaDevices for FakeDevices {
    fn request_microphone(&self) -> Result<MediaStream, CaptureError> {
        if self.deny_microphone {
            return Err(CaptureError::PermissionDenied(CaptureDevice::Microphone));
        }
        if self.no_microphone {
            return Err(CaptureError::DeviceNotAvailable(CaptureDevice::Microphone));
        }
        let stream = fake_stream(self.next_id("mic"), &[TrackKind::Audio]);
        self.opened.lock().push(stream.clone());
        Ok(stream)
    }

    fn request_display(&self, options: DisplayMediaOptions) -> Result<MediaStream, CaptureError> {
        if self.deny_display {
            return Err(CaptureError::PermissionDenied(CaptureDevice::DisplayShare));
        }
        let kinds: &[TrackKind] = if self.tab_without_audio || !options.audio {
            &[TrackKind::Video]
        } else {
            &[TrackKind::Video, TrackKind::Audio]
        };
        let stream = fake_stream(self.next_id("tab"), kinds);
        self.opened.lock().push(stream.clone());
        Ok(stream)
    }
}

#[derive(Default)]
pub struct GraphLog {
    pub contexts_created: usize,
    pub contexts_closed: usize,
    /// (source stream id, merger input) for every source → merger connection.
    pub merger_inputs: Vec<(String, u16)>,
}

#[derive(Default)]
pub struct FakeContexts {
    pub fail_merger: bool,
    pub log: Arc<Mutex<GraphLog>>,
}

struct FakeContext {
    log: Arc<Mutex<GraphLog>>,
    fail_merger: bool,
    sources: Vec<(u32, String)>,
    next_id: u32,
}

impl FakeContext {
    fn node(&mut self, kind: AudioNodeKind) -> AudioNode {
        self.next_id += 1;
        AudioNode::new(self.next_id, kind)
    }
}

impl AudioContext for FakeContext {
    fn sample_rate(&self) -> f64 {
        48000.0
    }

    fn create_media_stream_source(&mut self, stream: &MediaStream) -> Result<AudioNode, CaptureError> {
        let node = self.node(AudioNodeKind::MediaStreamSource);
        self.sources.push((node.id, stream.id().to_string()));
        Ok(node)
    }

    fn create_channel_merger(&mut self, _inputs: u16) -> Result<AudioNode, CaptureError> {
        if self.fail_merger {
            return Err(CaptureError::AudioGraphFailed("merger unavailable".into()));
        }
        Ok(self.node(AudioNodeKind::ChannelMerger))
    }

    fn create_media_stream_destination(&mut self) -> Result<AudioNode, CaptureError> {
        Ok(self.node(AudioNodeKind::MediaStreamDestination))
    }

    fn connect(&mut self, from: AudioNode, to: AudioNode, _output: u16, input: u16) -> Result<(), CaptureError> {
        if to.kind == AudioNodeKind::ChannelMerger {
            if let Some((_, stream_id)) = self.sources.iter().find(|(id, _)| *id == from.id) {
                self.log.lock().merger_inputs.push((stream_id.clone(), input));
            }
        }
        Ok(())
    }

    fn destination_stream(&self, destination: AudioNode) -> Result<MediaStream, CaptureError> {
        Ok(fake_stream(format!("mixed-{}", destination.id), &[TrackKind::Audio]))
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.log.lock().contexts_closed += 1;
        Ok(())
    }
}

impl AudioContextFactory for FakeContexts {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, CaptureError> {
        self.log.lock().contexts_created += 1;
        Ok(Box::new(FakeContext {
            log: Arc::clone(&self.log),
            fail_merger: self.fail_merger,
            sources: Vec::new(),
            next_id: 0,
        }))
    }
}

/// Encoder whose events are injected by the test through `FakeEncoders::sink`.
struct FakeEncoder {
    mime_type: Option<MimeType>,
    shared_sink: Arc<Mutex<Option<EncoderEventSink>>>,
    sink: Option<EncoderEventSink>,
    final_chunk: Option<Vec<u8>>,
    finalize_on_stop: bool,
    stop_requests: Arc<AtomicUsize>,
}

impl MediaEncoder for FakeEncoder {
    fn mime_type(&self) -> Option<MimeType> {
        self.mime_type.clone()
    }

    fn start(&mut self, sink: EncoderEventSink) -> Result<(), CaptureError> {
        *self.shared_sink.lock() = Some(sink.clone());
        self.sink = Some(sink);
        Ok(())
    }

    fn request_stop(&mut self) -> Result<(), CaptureError> {
        self.stop_requests.fetch_add(1, Ordering::SeqCst);
        if !self.finalize_on_stop {
            return Ok(());
        }
        if let Some(ref sink) = self.sink {
            if let Some(chunk) = self.final_chunk.take() {
                sink.data_available(chunk);
            }
            sink.stopped();
        }
        Ok(())
    }
}

pub struct FakeEncoders {
    pub supported: Vec<MimeType>,
    pub reject_explicit_type: bool,
    pub fail_construction: bool,
    /// What the encoder reports; `None` means echo the requested type.
    pub reported_mime_type: Option<Option<MimeType>>,
    pub final_chunk: Option<Vec<u8>>,
    pub finalize_on_stop: bool,
    pub created: Mutex<Vec<EncoderOptions>>,
    pub sink: Arc<Mutex<Option<EncoderEventSink>>>,
    pub stop_requests: Arc<AtomicUsize>,
}

impl Default for FakeEncoders {
    fn default() -> Self {
        Self {
            supported: vec![MimeType::new("audio/webm;codecs=opus"), MimeType::new("audio/webm")],
            reject_explicit_type: false,
            fail_construction: false,
            reported_mime_type: None,
            final_chunk: None,
            finalize_on_stop: true,
            created: Mutex::new(Vec::new()),
            sink: Arc::new(Mutex::new(None)),
            stop_requests: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeEncoders {
    /// Push an event as the running encoder would.
    pub fn emit(&self, data: &[u8]) {
        if let Some(ref sink) = *self.sink.lock() {
            sink.data_available(data.to_vec());
        }
    }

    pub fn emit_stopped(&self) {
        if let Some(ref sink) = *self.sink.lock() {
            sink.stopped();
        }
    }

    pub fn emit_error(&self, message: &str) {
        if let Some(ref sink) = *self.sink.lock() {
            sink.error(message);
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl MediaEncoderFactory for FakeEncoders {
    fn is_type_supported(&self, mime_type: &MimeType) -> bool {
        self.supported.contains(mime_type)
    }

    fn create(&self, _stream: &MediaStream, options: &EncoderOptions) -> Result<Box<dyn MediaEncoder>, CaptureError> {
        self.created.lock().push(options.clone());
        if self.fail_construction || (self.reject_explicit_type && options.mime_type.is_some()) {
            return Err(CaptureError::EncodingFailed("rejected".into()));
        }
        let mime_type = match self.reported_mime_type {
            Some(ref reported) => reported.clone(),
            None => options.mime_type.clone(),
        };
        Ok(Box::new(FakeEncoder {
            mime_type,
            shared_sink: Arc::clone(&self.sink),
            sink: None,
            final_chunk: self.final_chunk.clone(),
            finalize_on_stop: self.finalize_on_stop,
            stop_requests: Arc::clone(&self.stop_requests),
        }))
    }
}

#[derive(Default)]
pub struct FakeUrls {
    pub live: Mutex<HashSet<String>>,
    pub fail: bool,
    pub counter: AtomicUsize,
}

impl ObjectUrlRegistry for FakeUrls {
    fn create_object_url(&self, _blob: &Blob) -> Result<String, CaptureError> {
        if self.fail {
            return Err(CaptureError::Unknown("object URLs unavailable".into()));
        }
        let url = format!("blob:fake/{}", self.counter.fetch_add(1, Ordering::SeqCst));
        self.live.lock().insert(url.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        self.live.lock().remove(url);
    }
}

#[derive(Default)]
pub struct FakePlatform {
    pub devices: FakeDevices,
    pub contexts: FakeContexts,
    pub encoders: FakeEncoders,
    pub urls: FakeUrls,
}

impl CapturePlatform for FakePlatform {
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
