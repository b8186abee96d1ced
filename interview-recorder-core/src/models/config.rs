use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::encoding::MimeType;
use super::mode::CaptureMode;

/// Preferred encodings, richest first. Video+audio containers lead because
/// some hosts only expose the shared tab's audio through a video recorder.
pub const DEFAULT_PREFERRED_MIME_TYPES: [&str; 5] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
    "audio/webm;codecs=opus",
    "audio/webm",
];

/// Type assigned to the payload when the encoder reports none.
pub const DEFAULT_FALLBACK_MIME_TYPE: &str = "audio/webm";

/// Configuration for a recorder session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfiguration {
    /// Sources to record from (default: microphone).
    pub mode: CaptureMode,

    /// Encodings to try, in preference order.
    pub preferred_mime_types: Vec<MimeType>,

    /// MIME type used for the artifact if the encoder does not report one.
    pub fallback_mime_type: MimeType,

    /// Prefix of the synthesized filename (`<prefix>-<millis>.<ext>`).
    pub filename_prefix: String,

    /// Ask the encoder to emit a chunk at this interval. `None` lets the
    /// encoder buffer everything until stop.
    #[serde(with = "timeslice_millis")]
    pub timeslice: Option<Duration>,
}

impl RecorderConfiguration {
    pub fn with_mode(mode: CaptureMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.filename_prefix.trim().is_empty() {
            return Err("filename prefix must not be empty".into());
        }
        if self
            .filename_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
        {
            return Err(format!("invalid filename prefix: {}", self.filename_prefix));
        }
        if self.fallback_mime_type.container().split('/').count() != 2 {
            return Err(format!(
                "invalid fallback MIME type: {}",
                self.fallback_mime_type
            ));
        }
        if let Some(mime) = self
            .preferred_mime_types
            .iter()
            .find(|m| m.container().split('/').count() != 2)
        {
            return Err(format!("invalid preferred MIME type: {}", mime));
        }
        if self.timeslice.is_some_and(|t| t.is_zero()) {
            return Err("timeslice must be positive".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            mode: CaptureMode::default(),
            preferred_mime_types: DEFAULT_PREFERRED_MIME_TYPES
                .iter()
                .map(|m| MimeType::new(*m))
                .collect(),
            fallback_mime_type: MimeType::new(DEFAULT_FALLBACK_MIME_TYPE),
            filename_prefix: "audio".into(),
            timeslice: None,
        }
    }
}

mod timeslice_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
