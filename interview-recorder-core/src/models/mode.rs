use std::fmt;

use serde::{Deserialize, Serialize};

/// Which capture sources a session records from.
///
/// Chosen by the caller before `start()` and fixed for the lifetime of the
/// session that uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    /// Microphone only, recorded as delivered by the device.
    #[default]
    Microphone,
    /// Tab / display share (video + audio) recorded as delivered.
    SharedTab,
    /// Microphone on the left channel, shared tab audio on the right.
    Mixed,
}

impl CaptureMode {
    /// Whether this mode builds an audio graph.
    pub fn requires_mixing(&self) -> bool {
        matches!(self, Self::Mixed)
    }

    /// Whether this mode asks the host for a display/tab share.
    pub fn uses_display_share(&self) -> bool {
        matches!(self, Self::SharedTab | Self::Mixed)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Microphone => "microphone",
            Self::SharedTab => "sharedTab",
            Self::Mixed => "mixed",
        };
        f.write_str(name)
    }
}
