use crate::models::artifact::RecordingArtifact;
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;

/// Event delegate for recorder session notifications.
///
/// Called on whichever thread drives the session (`start`, `stop`,
/// `pump_events`). Implementations should marshal to the UI thread if needed.
pub trait RecorderDelegate: Send + Sync {
    /// Called on every state transition with the status line to display.
    fn on_state_changed(&self, state: &CaptureState, status: &str);

    /// Called when an attempt fails or recording breaks off.
    fn on_error(&self, error: &CaptureError);

    /// Called when a tab was shared without audio. Present `guidance`
    /// to the user instead of a generic failure.
    fn on_shared_audio_missing(&self, guidance: &str);

    /// Called once per successful stop. Teardown runs afterwards even if
    /// this panics.
    fn on_recording_finished(&self, artifact: &RecordingArtifact);
}
