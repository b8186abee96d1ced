use crate::models::error::CaptureError;
use crate::models::media_stream::MediaStream;

/// What to ask for when requesting a display/tab share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMediaOptions {
    pub video: bool,
    pub audio: bool,
}

impl Default for DisplayMediaOptions {
    fn default() -> Self {
        Self {
            video: true,
            audio: true,
        }
    }
}

/// Host capture capabilities.
///
/// Both requests may block on a user permission prompt; there is no
/// timeout. Implementations map a refused prompt to
/// `CaptureError::PermissionDenied` and a missing device to
/// `CaptureError::DeviceNotAvailable`.
pub trait MediaDevices: Send + Sync {
    /// Request an audio-only microphone stream.
    fn request_microphone(&self) -> Result<MediaStream, CaptureError>;

    /// Request a display/tab share. The user may decline to share audio,
    /// in which case the stream has no audio track.
    fn request_display(&self, options: DisplayMediaOptions) -> Result<MediaStream, CaptureError>;
}
