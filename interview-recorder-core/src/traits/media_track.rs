/// Kind of a media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// A single live track owned by the host (one microphone, one tab's audio,
/// one display's video).
///
/// `stop()` releases the underlying device capture and must be idempotent.
pub trait MediaTrack: Send + Sync {
    fn id(&self) -> &str;

    fn kind(&self) -> TrackKind;

    fn stop(&self);

    fn is_live(&self) -> bool;
}
