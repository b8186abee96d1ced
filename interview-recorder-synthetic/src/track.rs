use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use interview_recorder_core::traits::media_track::{MediaTrack, TrackKind};

/// Track handed out by the synthetic devices and graph.
#[derive(Debug)]
pub struct SyntheticTrack {
    id: String,
    kind: TrackKind,
    live: AtomicBool,
    stop_calls: AtomicUsize,
}

impl SyntheticTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            live: AtomicBool::new(true),
            stop_calls: AtomicUsize::new(0),
        }
    }

    /// How many times `stop()` was called, including repeats.
    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl MediaTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.live.swap(false, Ordering::SeqCst) {
            log::debug!("Track {} stopped", self.id);
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}
