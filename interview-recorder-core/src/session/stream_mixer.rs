use crate::models::error::CaptureError;
use crate::models::media_stream::MediaStream;
use crate::traits::audio_graph::{AudioContext, AudioContextFactory, AudioNode};

/// Merger input fed by the microphone (left channel).
pub const MICROPHONE_CHANNEL: u16 = 0;

/// Merger input fed by the shared tab (right channel).
pub const SHARED_TAB_CHANNEL: u16 = 1;

/// Audio graph merging microphone and shared-tab audio into one stereo
/// stream:
/// ```text
/// [mic source] ──→ merger input 0 (L) ─┐
///                                      ├→ [merger] → [destination] → output stream
/// [tab source] ──→ merger input 1 (R) ─┘
/// ```
pub struct MixedGraph {
    context: Box<dyn AudioContext>,
    microphone_source: AudioNode,
    shared_tab_source: AudioNode,
    merger: AudioNode,
    destination: AudioNode,
    output: MediaStream,
    closed: bool,
}

impl MixedGraph {
    /// The stereo stream to record.
    pub fn output_stream(&self) -> &MediaStream {
        &self.output
    }

    pub fn sample_rate(&self) -> f64 {
        self.context.sample_rate()
    }

    pub fn nodes(&self) -> [AudioNode; 4] {
        [
            self.microphone_source,
            self.shared_tab_source,
            self.merger,
            self.destination,
        ]
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the context and end the output stream. Only the first call
    /// does anything.
    pub fn close(&mut self) -> Result<(), CaptureError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.output.stop_all_tracks();
        self.context.close()
    }
}

/// Build the mixing graph for `microphone` (left) and `shared_tab` (right).
///
/// On failure the partially built context is closed before returning.
pub fn mix(
    contexts: &dyn AudioContextFactory,
    microphone: &MediaStream,
    shared_tab: &MediaStream,
) -> Result<MixedGraph, CaptureError> {
    let mut context = contexts.create_context()?;

    match build(context.as_mut(), microphone, shared_tab) {
        Ok((microphone_source, shared_tab_source, merger, destination, output)) => {
            log::debug!(
                "Mixed graph ready at {} Hz: mic {} -> L, tab {} -> R",
                context.sample_rate(),
                microphone.id(),
                shared_tab.id()
            );
            Ok(MixedGraph {
                context,
                microphone_source,
                shared_tab_source,
                merger,
                destination,
                output,
                closed: false,
            })
        }
        Err(e) => {
            if let Err(close_err) = context.close() {
                log::warn!("Failed to close partial audio graph: {}", close_err);
            }
            Err(e)
        }
    }
}

type GraphNodes = (AudioNode, AudioNode, AudioNode, AudioNode, MediaStream);

fn build(
    context: &mut dyn AudioContext,
    microphone: &MediaStream,
    shared_tab: &MediaStream,
) -> Result<GraphNodes, CaptureError> {
    let microphone_source = context.create_media_stream_source(microphone)?;
    let shared_tab_source = context.create_media_stream_source(shared_tab)?;
    let merger = context.create_channel_merger(2)?;
    let destination = context.create_media_stream_destination()?;

    context.connect(microphone_source, merger, 0, MICROPHONE_CHANNEL)?;
    context.connect(shared_tab_source, merger, 0, SHARED_TAB_CHANNEL)?;
    context.connect(merger, destination, 0, 0)?;

    let output = context.destination_stream(destination)?;
    Ok((microphone_source, shared_tab_source, merger, destination, output))
}
