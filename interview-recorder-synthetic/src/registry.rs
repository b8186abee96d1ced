//! Shared host state: which audio each stream carries, which contexts are
//! open, and which encoders are pulling audio.
//!
//! Lock order is encoder first, then registry. The registry never locks an
//! encoder while held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use interview_recorder_core::processing::channel_merger::{downmix_to_mono, ChannelMerger, InputResampler};
use interview_recorder_core::MediaStream;
use parking_lot::Mutex;

use crate::encoder::EncoderCore;
use crate::signal::Signal;

pub(crate) type SharedRegistry = Arc<Mutex<Registry>>;

/// Audio format and waveform of a synthetic capture device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneDevice {
    pub signal: Signal,
    pub sample_rate: f64,
    pub channels: u16,
}

impl ToneDevice {
    pub fn new(signal: Signal, sample_rate: f64, channels: u16) -> Self {
        Self {
            signal,
            sample_rate,
            channels,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum SourceKind {
    Device(ToneDevice),
    /// Output of a destination node fed by a 2-input merger.
    Merged {
        sample_rate: f64,
        inputs: [Option<String>; 2],
        context_closed: Arc<AtomicBool>,
    },
    /// Stream without audio, e.g. a tab shared with video only.
    Silent { sample_rate: f64 },
}

/// Resampler state for one merger input, tied to the stream feeding it.
struct InputFeed {
    stream_id: String,
    resampler: InputResampler,
}

struct Source {
    kind: SourceKind,
    stream: MediaStream,
    position: u64,
    feeds: [Option<InputFeed>; 2],
}

impl Source {
    fn format(&self) -> (f64, u16) {
        match &self.kind {
            SourceKind::Device(device) => (device.sample_rate, device.channels),
            SourceKind::Merged { sample_rate, .. } => (*sample_rate, 2),
            SourceKind::Silent { sample_rate } => (*sample_rate, 1),
        }
    }

    fn audio_live(&self) -> bool {
        self.stream.audio_tracks().any(|t| t.is_live())
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    sources: HashMap<String, Source>,
    device_streams: Vec<String>,
    contexts: Vec<Arc<AtomicBool>>,
    encoders: Vec<Weak<Mutex<EncoderCore>>>,
    next_id: u64,
}

impl Registry {
    pub(crate) fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::default()))
    }

    pub(crate) fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// Register a stream opened by a capture device.
    pub(crate) fn add_device_stream(&mut self, stream: MediaStream, kind: SourceKind) {
        self.device_streams.push(stream.id().to_string());
        self.add_source(stream, kind);
    }

    pub(crate) fn add_source(&mut self, stream: MediaStream, kind: SourceKind) {
        let id = stream.id().to_string();
        self.sources.insert(
            id,
            Source {
                kind,
                stream,
                position: 0,
                feeds: [None, None],
            },
        );
        self.prune();
    }

    /// Forget streams with no live track and closed contexts.
    pub(crate) fn prune(&mut self) {
        let before = self.sources.len();
        self.sources.retain(|_, source| source.stream.is_active());
        if self.sources.len() != before {
            log::trace!("Pruned {} ended stream(s)", before - self.sources.len());
        }
        let sources = &self.sources;
        self.device_streams.retain(|id| sources.contains_key(id));
        self.contexts.retain(|closed| !closed.load(Ordering::SeqCst));
    }

    #[cfg(test)]
    pub(crate) fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub(crate) fn update_source(&mut self, stream_id: &str, kind: SourceKind) {
        if let Some(source) = self.sources.get_mut(stream_id) {
            source.kind = kind;
        }
    }

    pub(crate) fn add_context(&mut self, closed: Arc<AtomicBool>) {
        self.prune();
        self.contexts.push(closed);
    }

    pub(crate) fn add_encoder(&mut self, encoder: Weak<Mutex<EncoderCore>>) {
        self.encoders.retain(|e| e.strong_count() > 0);
        self.encoders.push(encoder);
    }

    pub(crate) fn running_encoders(&mut self) -> Vec<Arc<Mutex<EncoderCore>>> {
        self.encoders.retain(|e| e.strong_count() > 0);
        self.encoders.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn format_of(&self, stream_id: &str) -> Option<(f64, u16)> {
        self.sources.get(stream_id).map(Source::format)
    }

    pub(crate) fn stream(&self, stream_id: &str) -> Option<MediaStream> {
        self.sources.get(stream_id).map(|s| s.stream.clone())
    }

    /// Device streams that still have a live track.
    pub(crate) fn open_device_streams(&mut self) -> Vec<MediaStream> {
        self.prune();
        self.device_streams
            .iter()
            .filter_map(|id| self.sources.get(id))
            .map(|s| s.stream.clone())
            .collect()
    }

    pub(crate) fn open_context_count(&mut self) -> usize {
        self.prune();
        self.contexts.len()
    }

    /// Render `frames` frames of a stream in its native format, interleaved.
    ///
    /// Returns `None` for an unknown stream. Ended tracks and closed
    /// contexts render silence.
    pub(crate) fn render(&mut self, stream_id: &str, frames: usize) -> Option<Vec<f32>> {
        let (kind, position, live, (_, channels)) = {
            let source = self.sources.get(stream_id)?;
            (source.kind.clone(), source.position, source.audio_live(), source.format())
        };

        let samples = match kind {
            SourceKind::Device(device) if live => {
                let mono = device.signal.render(position, frames, device.sample_rate);
                mono.iter()
                    .flat_map(|&s| std::iter::repeat(s).take(channels as usize))
                    .collect()
            }
            SourceKind::Merged {
                sample_rate,
                inputs,
                context_closed,
            } if live && !context_closed.load(Ordering::SeqCst) => {
                let mut feeds = self
                    .sources
                    .get_mut(stream_id)
                    .map(|source| std::mem::take(&mut source.feeds))
                    .unwrap_or_default();
                let left = self.render_input(&mut feeds[0], inputs[0].as_deref(), frames, sample_rate);
                let right = self.render_input(&mut feeds[1], inputs[1].as_deref(), frames, sample_rate);
                if let Some(source) = self.sources.get_mut(stream_id) {
                    source.feeds = feeds;
                }
                ChannelMerger::new(sample_rate).merge(&left, &right)
            }
            _ => vec![0.0; frames * channels as usize],
        };

        if let Some(source) = self.sources.get_mut(stream_id) {
            source.position += frames as u64;
        }
        Some(samples)
    }

    /// Render one merger input as exactly `frames` mono samples at `rate`.
    ///
    /// The feed keeps the input's resampling position across renders; it is
    /// reset when a different stream is connected.
    fn render_input(&mut self, feed: &mut Option<InputFeed>, stream_id: Option<&str>, frames: usize, rate: f64) -> Vec<f32> {
        let Some((id, (source_rate, channels))) = stream_id.and_then(|id| self.format_of(id).map(|f| (id, f))) else {
            return vec![0.0; frames];
        };

        if feed.as_ref().map(|f| f.stream_id.as_str()) != Some(id) {
            *feed = Some(InputFeed {
                stream_id: id.to_string(),
                resampler: ChannelMerger::new(rate).resampler(source_rate),
            });
        }
        let Some(feed) = feed.as_mut() else {
            return vec![0.0; frames];
        };

        let needed = feed.resampler.source_frames_needed(frames);
        let native = self.render(id, needed).unwrap_or_default();
        feed.resampler.push(&downmix_to_mono(&native, channels as usize));
        feed.resampler.produce(frames)
    }
}
