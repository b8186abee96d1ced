//! Audio graph that renders a 2-input channel merger sample by sample.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use interview_recorder_core::{
    AudioContext, AudioContextFactory, AudioNode, AudioNodeKind, CaptureError, MediaStream, MediaTrack, TrackKind,
};

use crate::registry::{SharedRegistry, SourceKind};
use crate::track::SyntheticTrack;

/// Only stereo mergers can be rendered.
pub const SUPPORTED_MERGER_INPUTS: u16 = 2;

enum NodeState {
    Source { stream_id: String },
    Merger { inputs: [Option<u32>; 2] },
    Destination { merger: Option<u32>, stream: MediaStream },
}

pub struct SyntheticAudioContextFactory {
    registry: SharedRegistry,
    sample_rate: f64,
}

impl SyntheticAudioContextFactory {
    pub(crate) fn new(registry: SharedRegistry, sample_rate: f64) -> Self {
        Self { registry, sample_rate }
    }
}

impl AudioContextFactory for SyntheticAudioContextFactory {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, CaptureError> {
        let closed = Arc::new(AtomicBool::new(false));
        self.registry.lock().add_context(closed.clone());
        log::debug!("Synthetic audio context created at {} Hz", self.sample_rate);
        Ok(Box::new(SyntheticAudioContext {
            registry: self.registry.clone(),
            sample_rate: self.sample_rate,
            nodes: HashMap::new(),
            next_node: 0,
            closed,
        }))
    }
}

pub struct SyntheticAudioContext {
    registry: SharedRegistry,
    sample_rate: f64,
    nodes: HashMap<u32, NodeState>,
    next_node: u32,
    closed: Arc<AtomicBool>,
}

impl SyntheticAudioContext {
    fn ensure_open(&self) -> Result<(), CaptureError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CaptureError::AudioGraphFailed("audio context is closed".into()));
        }
        Ok(())
    }

    fn add_node(&mut self, kind: AudioNodeKind, state: NodeState) -> AudioNode {
        self.next_node += 1;
        self.nodes.insert(self.next_node, state);
        AudioNode::new(self.next_node, kind)
    }

    fn node(&self, node: AudioNode) -> Result<&NodeState, CaptureError> {
        self.nodes
            .get(&node.id)
            .ok_or_else(|| CaptureError::AudioGraphFailed(format!("unknown node {}", node.id)))
    }

    /// Point every destination's stream at whatever its merger is fed with.
    fn refresh_destinations(&self) {
        let mut registry = self.registry.lock();
        for state in self.nodes.values() {
            let NodeState::Destination { merger, stream } = state else {
                continue;
            };
            let inputs = match merger.and_then(|m| self.nodes.get(&m)) {
                Some(NodeState::Merger { inputs }) => inputs.map(|input| match input.and_then(|i| self.nodes.get(&i)) {
                    Some(NodeState::Source { stream_id }) => Some(stream_id.clone()),
                    _ => None,
                }),
                _ => [None, None],
            };
            registry.update_source(
                stream.id(),
                SourceKind::Merged {
                    sample_rate: self.sample_rate,
                    inputs,
                    context_closed: self.closed.clone(),
                },
            );
        }
    }
}

impl AudioContext for SyntheticAudioContext {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn create_media_stream_source(&mut self, stream: &MediaStream) -> Result<AudioNode, CaptureError> {
        self.ensure_open()?;
        if !stream.has_audio() {
            return Err(CaptureError::AudioGraphFailed(format!(
                "stream {} has no audio track",
                stream.id()
            )));
        }
        Ok(self.add_node(
            AudioNodeKind::MediaStreamSource,
            NodeState::Source {
                stream_id: stream.id().to_string(),
            },
        ))
    }

    fn create_channel_merger(&mut self, inputs: u16) -> Result<AudioNode, CaptureError> {
        self.ensure_open()?;
        if inputs != SUPPORTED_MERGER_INPUTS {
            return Err(CaptureError::AudioGraphFailed(format!(
                "unsupported merger input count {}",
                inputs
            )));
        }
        Ok(self.add_node(AudioNodeKind::ChannelMerger, NodeState::Merger { inputs: [None, None] }))
    }

    fn create_media_stream_destination(&mut self) -> Result<AudioNode, CaptureError> {
        self.ensure_open()?;
        let stream = {
            let mut registry = self.registry.lock();
            let track: Arc<dyn MediaTrack> =
                Arc::new(SyntheticTrack::new(registry.next_id("dest-track"), TrackKind::Audio));
            let stream = MediaStream::new(registry.next_id("dest"), vec![track]);
            registry.add_source(
                stream.clone(),
                SourceKind::Merged {
                    sample_rate: self.sample_rate,
                    inputs: [None, None],
                    context_closed: self.closed.clone(),
                },
            );
            stream
        };
        Ok(self.add_node(
            AudioNodeKind::MediaStreamDestination,
            NodeState::Destination { merger: None, stream },
        ))
    }

    fn connect(&mut self, from: AudioNode, to: AudioNode, output: u16, input: u16) -> Result<(), CaptureError> {
        self.ensure_open()?;
        if output != 0 {
            return Err(CaptureError::AudioGraphFailed(format!("node {} has no output {}", from.id, output)));
        }

        match (self.node(from)?, self.node(to)?) {
            (NodeState::Source { .. }, NodeState::Merger { .. }) if input < SUPPORTED_MERGER_INPUTS => {}
            (NodeState::Merger { .. }, NodeState::Destination { .. }) if input == 0 => {}
            _ => {
                return Err(CaptureError::AudioGraphFailed(format!(
                    "cannot connect node {} to input {} of node {}",
                    from.id, input, to.id
                )))
            }
        }

        match self.nodes.get_mut(&to.id) {
            Some(NodeState::Merger { inputs }) => inputs[input as usize] = Some(from.id),
            Some(NodeState::Destination { merger, .. }) => *merger = Some(from.id),
            _ => {}
        }
        self.refresh_destinations();
        Ok(())
    }

    fn destination_stream(&self, destination: AudioNode) -> Result<MediaStream, CaptureError> {
        match self.node(destination)? {
            NodeState::Destination { stream, .. } => Ok(stream.clone()),
            _ => Err(CaptureError::AudioGraphFailed(format!(
                "node {} is not a destination",
                destination.id
            ))),
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AudioGraphFailed("audio context already closed".into()));
        }
        log::debug!("Synthetic audio context closed ({} nodes)", self.nodes.len());
        Ok(())
    }
}
