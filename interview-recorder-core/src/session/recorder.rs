use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::models::artifact::{suggested_filename, Blob, RecordingArtifact, RecordingMetadata};
use crate::models::config::RecorderConfiguration;
use crate::models::encoding::EncodingChoice;
use crate::models::error::CaptureError;
use crate::models::mode::CaptureMode;
use crate::models::state::CaptureState;
use crate::processing::chunk_buffer::ChunkBuffer;
use crate::processing::format_negotiator;
use crate::traits::media_encoder::{EncoderEvent, EncoderEventSink, MediaEncoder};
use crate::traits::platform::CapturePlatform;
use crate::traits::recorder_delegate::RecorderDelegate;

use super::acquisition::{self, AcquiredSource};
use super::resources::SessionResources;

/// Recorder engine: acquires sources, drives the encoder and hands the
/// finished recording to the caller.
///
/// Data flow:
/// ```text
/// [MediaDevices] → [AcquiredSource] ─(mixed)→ [MixedGraph] ─┐
///                         └────────────────────────────────┴→ [MediaEncoder] → events → [ChunkBuffer] → RecordingArtifact
/// ```
///
/// Encoder events are queued and applied on the caller's thread by
/// `stop()`, `pump_events()` and `wait_for_completion()`, so every state
/// transition runs to completion before the next one starts.
pub struct RecorderSession<P: CapturePlatform> {
    platform: P,
    config: RecorderConfiguration,
    state: CaptureState,
    delegate: Option<Arc<dyn RecorderDelegate>>,

    resources: SessionResources,
    source: Option<AcquiredSource>,
    encoding: Option<EncodingChoice>,
    encoder: Option<Box<dyn MediaEncoder>>,
    events: Option<Receiver<EncoderEvent>>,
    chunks: ChunkBuffer,
    capture_start: Option<Instant>,

    artifact: Option<RecordingArtifact>,
}

impl<P: CapturePlatform> RecorderSession<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            config: RecorderConfiguration::default(),
            state: CaptureState::Idle,
            delegate: None,
            resources: SessionResources::new(),
            source: None,
            encoding: None,
            encoder: None,
            events: None,
            chunks: ChunkBuffer::new(),
            capture_start: None,
            artifact: None,
        }
    }

    pub fn with_configuration(platform: P, config: RecorderConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        let mut session = Self::new(platform);
        session.config = config;
        Ok(session)
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn configuration(&self) -> &RecorderConfiguration {
        &self.config
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn status_text(&self) -> String {
        self.state.status_text()
    }

    pub fn mode(&self) -> CaptureMode {
        self.config.mode
    }

    /// Encoding negotiated for the current or last attempt.
    pub fn encoding(&self) -> Option<&EncodingChoice> {
        self.encoding.as_ref()
    }

    pub fn buffered_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.chunks.total_bytes()
    }

    /// Streams and graphs currently held open by this session.
    pub fn active_resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Time since recording started, while recording or stopping.
    pub fn elapsed(&self) -> Option<Duration> {
        self.capture_start.map(|start| start.elapsed())
    }

    /// The artifact of the last successful stop, if not taken yet.
    pub fn artifact(&self) -> Option<&RecordingArtifact> {
        self.artifact.as_ref()
    }

    pub fn take_artifact(&mut self) -> Option<RecordingArtifact> {
        self.artifact.take()
    }

    /// Select the capture mode for the next `start()`.
    pub fn configure(&mut self, mode: CaptureMode) -> Result<(), CaptureError> {
        if self.state.is_active() {
            return Err(CaptureError::InvalidState(
                "cannot change mode while a recording is active".into(),
            ));
        }
        log::debug!("Capture mode set to {}", mode);
        self.config.mode = mode;
        Ok(())
    }

    /// Replace the whole configuration. Same restrictions as `configure`.
    pub fn set_configuration(&mut self, config: RecorderConfiguration) -> Result<(), CaptureError> {
        if self.state.is_active() {
            return Err(CaptureError::InvalidState(
                "cannot reconfigure while a recording is active".into(),
            ));
        }
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        self.config = config;
        Ok(())
    }

    /// Acquire sources and start encoding.
    ///
    /// Transitions: idle/stopped/failed → selecting_source → recording, or
    /// → failed with every acquired resource released.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state.is_active() {
            return Err(CaptureError::InvalidState(format!(
                "cannot start while {}",
                self.state.status_text()
            )));
        }

        self.artifact = None;
        self.chunks.discard();
        self.encoding = None;
        self.set_state(CaptureState::SelectingSource);

        match self.begin() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail(e.clone());
                Err(e)
            }
        }
    }

    /// Ask the encoder to finalize. A no-op unless recording.
    ///
    /// Transitions: recording → stopping. The stopping → stopped transition
    /// happens when the encoder's final event is processed, which for a
    /// synchronous encoder is before this returns.
    pub fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_recording() {
            log::debug!("stop() ignored in state {:?}", self.state);
            return Ok(());
        }
        if let Some(error) = self.check_inputs() {
            return Err(error);
        }

        self.set_state(CaptureState::Stopping);

        let requested = match self.encoder.as_mut() {
            Some(encoder) => encoder.request_stop(),
            None => Err(CaptureError::InvalidState("no encoder".into())),
        };
        if let Err(e) = requested {
            let error = CaptureError::EncodingFailed(format!("stop request failed: {}", e));
            self.fail(error.clone());
            return Err(error);
        }

        self.pump_events();
        Ok(())
    }

    /// Apply all queued encoder events. Returns how many were handled.
    pub fn pump_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.events.as_ref().map(|rx| rx.try_recv()) {
                Some(Ok(event)) => event,
                Some(Err(TryRecvError::Disconnected)) => {
                    EncoderEvent::Error("encoder went away without finishing".into())
                }
                Some(Err(TryRecvError::Empty)) | None => break,
            };
            handled += 1;
            self.handle_event(event);
        }
        self.check_inputs();
        handled
    }

    /// Block until the session leaves recording/stopping or `timeout`
    /// elapses, applying events as they arrive. Returns the state reached.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> &CaptureState {
        let deadline = Instant::now() + timeout;
        while matches!(self.state, CaptureState::Recording | CaptureState::Stopping) {
            if self.check_inputs().is_some() {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let event = match self.events.as_ref().map(|rx| rx.recv_timeout(remaining)) {
                Some(Ok(event)) => event,
                Some(Err(RecvTimeoutError::Disconnected)) => {
                    EncoderEvent::Error("encoder went away without finishing".into())
                }
                Some(Err(RecvTimeoutError::Timeout)) | None => break,
            };
            self.handle_event(event);
        }
        &self.state
    }

    /// Apply one encoder event to the state machine.
    pub fn handle_event(&mut self, event: EncoderEvent) {
        let listening = matches!(self.state, CaptureState::Recording | CaptureState::Stopping);
        if !listening {
            log::debug!("Encoder event ignored in state {:?}", self.state);
            return;
        }

        match event {
            EncoderEvent::DataAvailable(data) => {
                let len = data.len();
                if self.chunks.push(data) {
                    log::trace!("Buffered chunk #{} ({} bytes)", self.chunks.len(), len);
                }
            }
            EncoderEvent::Stopped => {
                if self.state.is_recording() {
                    log::info!("Encoder stopped on its own; finalizing");
                    self.set_state(CaptureState::Stopping);
                }
                self.finish();
            }
            EncoderEvent::Error(message) => {
                log::error!("Recording failed: {}", message);
                self.fail(CaptureError::DeviceLost(message));
            }
        }
    }

    // --- Internal helpers ---

    /// Fail the recording if a captured input lost its audio. In mixed mode
    /// the graph output keeps running after an input ends, so the encoder
    /// alone would never notice.
    fn check_inputs(&mut self) -> Option<CaptureError> {
        if !matches!(self.state, CaptureState::Recording | CaptureState::Stopping) {
            return None;
        }
        let ended = self.resources.ended_input()?.id().to_string();
        let error = CaptureError::DeviceLost(format!("input stream {} ended", ended));
        log::error!("Recording failed: {}", error);
        self.fail(error.clone());
        Some(error)
    }

    fn begin(&mut self) -> Result<(), CaptureError> {
        let source = acquisition::acquire(self.config.mode, &self.platform, &mut self.resources)?;

        let encoders = self.platform.encoders();
        let encoding = format_negotiator::pick_encoding(encoders, &self.config.preferred_mime_types);
        let mut encoder = format_negotiator::create_encoder(
            encoders,
            source.recording_stream(),
            &encoding,
            self.config.timeslice,
        )?;

        let (tx, rx) = mpsc::channel();
        encoder.start(EncoderEventSink::new(tx))?;

        log::info!(
            "Recording {} via stream {} ({:?})",
            source.mode(),
            source.recording_stream().id(),
            encoding
        );

        self.source = Some(source);
        self.encoding = Some(encoding);
        self.encoder = Some(encoder);
        self.events = Some(rx);
        self.capture_start = Some(Instant::now());
        self.set_state(CaptureState::Recording);
        Ok(())
    }

    /// stopping → stopped: assemble the artifact, deliver it, tear down.
    fn finish(&mut self) {
        let mime_type = self
            .encoder
            .as_ref()
            .and_then(|e| e.mime_type())
            .unwrap_or_else(|| self.config.fallback_mime_type.clone());
        let chunk_count = self.chunks.len();
        let duration_secs = self.elapsed().map(|d| d.as_secs_f64()).unwrap_or(0.0);
        let blob = Blob::new(self.chunks.take_payload(), mime_type);

        let playable_url = match self.platform.object_urls().create_object_url(&blob) {
            Ok(url) => url,
            Err(e) => {
                self.fail(e);
                return;
            }
        };

        let created_at = Utc::now();
        let filename = suggested_filename(&self.config.filename_prefix, created_at, blob.mime_type());
        let metadata = RecordingMetadata::new(
            &blob,
            &filename,
            self.config.mode,
            duration_secs,
            chunk_count,
            created_at,
        );
        let artifact = RecordingArtifact {
            blob,
            playable_url,
            suggested_filename: filename,
            metadata,
        };

        log::info!(
            "Recorded {} ({} bytes in {} chunks, {:.1}s)",
            artifact.suggested_filename,
            artifact.metadata.size_bytes,
            chunk_count,
            duration_secs
        );

        if let Some(delegate) = self.delegate.clone() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| delegate.on_recording_finished(&artifact)));
            if delivered.is_err() {
                log::error!("Completion delegate panicked; continuing teardown");
            }
        }

        self.artifact = Some(artifact);
        self.teardown();
        self.set_state(CaptureState::Stopped);
    }

    /// Any state → failed. Buffered chunks are discarded.
    fn fail(&mut self, error: CaptureError) {
        log::warn!("Capture failed: {}", error);
        self.chunks.discard();
        self.teardown();
        self.set_state(CaptureState::Failed(error.clone()));

        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
            if let Some(guidance) = error.corrective_guidance() {
                delegate.on_shared_audio_missing(guidance);
            }
        }
    }

    fn teardown(&mut self) {
        self.encoder = None;
        self.events = None;
        self.source = None;
        self.capture_start = None;

        let report = self.resources.drain();
        log::debug!(
            "Teardown: {} stream(s), {} track(s) stopped, graph closed: {}",
            report.streams_closed,
            report.tracks_stopped,
            report.graph_closed
        );
    }

    fn set_state(&mut self, new_state: CaptureState) {
        log::debug!("Recorder state: {:?} -> {:?}", self.state, new_state);
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state, &self.state.status_text());
        }
    }
}
