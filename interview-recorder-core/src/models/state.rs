use super::error::CaptureError;

/// Recorder session state machine.
///
/// State transitions:
/// ```text
/// idle → selecting_source → recording → stopping → stopped
///              ↓                ↓           ↓
///            failed           failed      failed
/// ```
/// `stopped` and `failed` accept a new `start()`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    SelectingSource,
    Recording,
    Stopping,
    Stopped,
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed(_))
    }

    /// A session is active from source selection until finalization.
    /// `start()` and `configure()` are refused while active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::SelectingSource | Self::Recording | Self::Stopping)
    }

    pub fn error(&self) -> Option<&CaptureError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Status line surfaced to the caller for this state.
    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => "ready".into(),
            Self::SelectingSource => "selecting source...".into(),
            Self::Recording => "recording...".into(),
            Self::Stopping => "stopping...".into(),
            Self::Stopped => "recorded".into(),
            Self::Failed(e) => e.to_string(),
        }
    }
}
