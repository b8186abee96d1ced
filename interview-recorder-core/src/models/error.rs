use std::fmt;

use thiserror::Error;

/// Host capability a capture request was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureDevice {
    Microphone,
    DisplayShare,
}

impl fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Microphone => f.write_str("microphone"),
            Self::DisplayShare => f.write_str("display share"),
        }
    }
}

/// Shown to the user when a tab was shared without its audio.
pub const SHARED_AUDIO_GUIDANCE: &str =
    "Tick \"Share tab audio\" in the browser's share dialog, then start the recording again.";

/// Errors that can occur while acquiring sources or recording.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied for {0}")]
    PermissionDenied(CaptureDevice),

    #[error("{0} not available")]
    DeviceNotAvailable(CaptureDevice),

    /// The tab/display share came back without any audio track.
    #[error("shared tab audio is not enabled")]
    SharedAudioNotEnabled,

    #[error("audio graph failed: {0}")]
    AudioGraphFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// A device or the encoder failed while recording.
    #[error("capture device lost: {0}")]
    DeviceLost(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Errors the user can fix themselves before retrying.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Self::SharedAudioNotEnabled | Self::PermissionDenied(_) | Self::DeviceNotAvailable(_)
        )
    }

    /// Instructions to present instead of a plain failure message.
    pub fn corrective_guidance(&self) -> Option<&'static str> {
        match self {
            Self::SharedAudioNotEnabled => Some(SHARED_AUDIO_GUIDANCE),
            _ => None,
        }
    }
}
