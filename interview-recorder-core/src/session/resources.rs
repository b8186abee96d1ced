use crate::models::media_stream::MediaStream;

use super::stream_mixer::MixedGraph;

/// What a teardown released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub streams_closed: usize,
    pub tracks_stopped: usize,
    pub graph_closed: bool,
}

/// Every hardware stream and audio graph acquired during one session.
///
/// Drained exactly once at session end, whatever the exit path; anything
/// still registered when the registry is dropped is released then.
#[derive(Default)]
pub struct SessionResources {
    streams: Vec<MediaStream>,
    graph: Option<MixedGraph>,
}

impl SessionResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a raw stream for closing at teardown. Registering the same
    /// stream twice is a no-op.
    pub fn register_stream(&mut self, stream: MediaStream) {
        if self.streams.iter().any(|s| s.id() == stream.id()) {
            return;
        }
        log::debug!("Registered stream {}", stream.id());
        self.streams.push(stream);
    }

    pub fn attach_graph(&mut self, graph: MixedGraph) {
        if let Some(mut previous) = self.graph.replace(graph) {
            log::warn!("Replacing an open audio graph; closing the old one");
            if let Err(e) = previous.close() {
                log::warn!("Failed to close audio graph: {}", e);
            }
        }
    }

    pub fn graph(&self) -> Option<&MixedGraph> {
        self.graph.as_ref()
    }

    /// First registered stream that carried audio and has none left, e.g.
    /// an unplugged microphone or a tab share the user ended.
    pub fn ended_input(&self) -> Option<&MediaStream> {
        self.streams
            .iter()
            .find(|s| s.audio_tracks().next().is_some() && !s.audio_tracks().any(|t| t.is_live()))
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Streams plus graph currently held.
    pub fn len(&self) -> usize {
        self.streams.len() + usize::from(self.graph.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop every registered stream and close the graph.
    ///
    /// Failures are logged and never stop the rest of the drain. A second
    /// call finds nothing left and returns an empty report.
    pub fn drain(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();

        if let Some(mut graph) = self.graph.take() {
            match graph.close() {
                Ok(()) => report.graph_closed = true,
                Err(e) => log::warn!("Failed to close audio graph: {}", e),
            }
        }

        for stream in self.streams.drain(..) {
            report.tracks_stopped += stream.stop_all_tracks();
            report.streams_closed += 1;
        }

        report
    }
}

impl Drop for SessionResources {
    fn drop(&mut self) {
        if !self.is_empty() {
            let report = self.drain();
            log::warn!("Session resources released on drop: {:?}", report);
        }
    }
}
