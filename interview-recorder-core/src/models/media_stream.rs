use std::fmt;
use std::sync::Arc;

use crate::traits::media_track::{MediaTrack, TrackKind};

/// Handle to a live media stream obtained from the host.
///
/// The stream itself is just an id plus the host's track handles; cloning
/// it shares the same tracks, so stopping through any clone stops the
/// underlying device capture.
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_tracks().next().is_some()
    }

    /// A stream is active while at least one of its tracks is live.
    pub fn is_active(&self) -> bool {
        self.tracks.iter().any(|t| t.is_live())
    }

    /// Stop every track. Returns how many tracks were still live.
    pub fn stop_all_tracks(&self) -> usize {
        let mut stopped = 0;
        for track in &self.tracks {
            if track.is_live() {
                track.stop();
                stopped += 1;
            }
        }
        stopped
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("audio_tracks", &self.audio_tracks().count())
            .field("video_tracks", &self.video_tracks().count())
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Track {
        kind: TrackKind,
        live: AtomicBool,
    }

    impl Track {
        fn new(kind: TrackKind) -> Arc<dyn MediaTrack> {
            Arc::new(Self {
                kind,
                live: AtomicBool::new(true),
            })
        }
    }

    impl MediaTrack for Track {
        fn id(&self) -> &str {
            "track"
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

    #[test]
    fn counts_tracks_by_kind() {
        let stream = MediaStream::new(
            "s1",
            vec![Track::new(TrackKind::Video), Track::new(TrackKind::Audio)],
        );

        assert!(stream.has_audio());
        assert_eq!(stream.audio_tracks().count(), 1);
        assert_eq!(stream.video_tracks().count(), 1);
    }

    #[test]
    fn video_only_stream_has_no_audio() {
        let stream = MediaStream::new("s2", vec![Track::new(TrackKind::Video)]);
        assert!(!stream.has_audio());
        assert!(stream.is_active());
    }

    #[test]
    fn stop_all_tracks_is_idempotent() {
        let stream = MediaStream::new(
            "s3",
            vec![Track::new(TrackKind::Audio), Track::new(TrackKind::Video)],
        );
        let clone = stream.clone();

        assert_eq!(stream.stop_all_tracks(), 2);
        assert!(!clone.is_active());
        assert_eq!(clone.stop_all_tracks(), 0);
    }
}
