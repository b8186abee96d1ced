use crate::models::error::CaptureError;
use crate::models::media_stream::MediaStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioNodeKind {
    MediaStreamSource,
    ChannelMerger,
    MediaStreamDestination,
}

/// Handle to a node inside one host audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioNode {
    pub id: u32,
    pub kind: AudioNodeKind,
}

impl AudioNode {
    pub fn new(id: u32, kind: AudioNodeKind) -> Self {
        Self { id, kind }
    }
}

/// Host audio processing context.
///
/// Nodes are only valid within the context that created them. After
/// `close()` the context renders nothing and its destination streams end.
pub trait AudioContext: Send {
    fn sample_rate(&self) -> f64;

    fn create_media_stream_source(&mut self, stream: &MediaStream) -> Result<AudioNode, CaptureError>;

    fn create_channel_merger(&mut self, inputs: u16) -> Result<AudioNode, CaptureError>;

    fn create_media_stream_destination(&mut self) -> Result<AudioNode, CaptureError>;

    /// Connect output `output` of `from` to input `input` of `to`.
    fn connect(&mut self, from: AudioNode, to: AudioNode, output: u16, input: u16) -> Result<(), CaptureError>;

    /// The stream produced by a destination node.
    fn destination_stream(&self, destination: AudioNode) -> Result<MediaStream, CaptureError>;

    fn close(&mut self) -> Result<(), CaptureError>;
}

/// Creates audio contexts.
pub trait AudioContextFactory: Send + Sync {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, CaptureError>;
}
