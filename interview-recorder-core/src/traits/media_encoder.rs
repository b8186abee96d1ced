use std::sync::mpsc::Sender;

use crate::models::encoding::MimeType;
use crate::models::error::CaptureError;
use crate::models::media_stream::MediaStream;

/// Options passed when constructing an encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Explicit container/codec, or `None` for the encoder's default.
    pub mime_type: Option<MimeType>,
    /// Emit a chunk at this interval instead of only at stop.
    pub timeslice: Option<std::time::Duration>,
}

/// Events emitted by a running encoder, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A segment of encoded output. May be empty.
    DataAvailable(Vec<u8>),
    /// The encoder finished; no further events follow.
    Stopped,
    /// The encoder or one of its inputs failed; no further events follow.
    Error(String),
}

/// Where an encoder delivers its events.
///
/// Sending never blocks. Events sent after the owning session was torn
/// down are dropped silently.
#[derive(Debug, Clone)]
pub struct EncoderEventSink {
    tx: Sender<EncoderEvent>,
}

impl EncoderEventSink {
    pub fn new(tx: Sender<EncoderEvent>) -> Self {
        Self { tx }
    }

    pub fn data_available(&self, data: Vec<u8>) {
        self.send(EncoderEvent::DataAvailable(data));
    }

    pub fn stopped(&self) {
        self.send(EncoderEvent::Stopped);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(EncoderEvent::Error(message.into()));
    }

    fn send(&self, event: EncoderEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Encoder event dropped: session no longer listening");
        }
    }
}

/// A chunked media encoder bound to one stream.
pub trait MediaEncoder: Send {
    /// The MIME type the encoder actually produces, if known.
    fn mime_type(&self) -> Option<MimeType>;

    /// Begin encoding. Data events flow into `sink` until stop or error.
    fn start(&mut self, sink: EncoderEventSink) -> Result<(), CaptureError>;

    /// Ask the encoder to flush and finish. The final `DataAvailable`
    /// (if any) and `Stopped` follow through the sink, possibly before
    /// this call returns.
    fn request_stop(&mut self) -> Result<(), CaptureError>;
}

/// Creates encoders and answers format-support queries.
pub trait MediaEncoderFactory: Send + Sync {
    fn is_type_supported(&self, mime_type: &MimeType) -> bool;

    fn create(&self, stream: &MediaStream, options: &EncoderOptions) -> Result<Box<dyn MediaEncoder>, CaptureError>;
}
