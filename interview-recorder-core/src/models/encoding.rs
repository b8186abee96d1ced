use std::fmt;

use serde::{Deserialize, Serialize};

/// A container/codec MIME string such as `video/webm;codecs=vp9,opus`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MimeType(String);

impl MimeType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `type/subtype` part, lowercased, without parameters.
    pub fn container(&self) -> String {
        self.0
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Codecs listed in the `codecs=` parameter, in order.
    pub fn codecs(&self) -> Vec<String> {
        self.0
            .split(';')
            .skip(1)
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("codecs")
                    .then(|| value.trim().trim_matches('"').to_string())
            })
            .flat_map(|list| {
                list.split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Whether the container carries a video track.
    pub fn is_video(&self) -> bool {
        self.container().starts_with("video/")
    }

    /// File extension for a recording stored in this container.
    pub fn file_extension(&self) -> &'static str {
        let container = self.container();
        let subtype = container.split('/').nth(1).unwrap_or_default();
        match subtype {
            "ogg" => "ogg",
            "mp4" => "m4a",
            "wav" | "wave" | "x-wav" => "wav",
            "mpeg" => "mp3",
            _ => "webm",
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MimeType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Encoding chosen once at session start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingChoice {
    /// A preferred type the host reported as supported.
    Preferred(MimeType),
    /// Nothing matched; the encoder is built without an explicit type.
    PlatformDefault,
}

impl EncodingChoice {
    pub fn mime_type(&self) -> Option<&MimeType> {
        match self {
            Self::Preferred(mime) => Some(mime),
            Self::PlatformDefault => None,
        }
    }

    pub fn is_platform_default(&self) -> bool {
        matches!(self, Self::PlatformDefault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_container_and_codecs() {
        let mime = MimeType::new("video/webm;codecs=vp9,opus");
        assert_eq!(mime.container(), "video/webm");
        assert_eq!(mime.codecs(), vec!["vp9".to_string(), "opus".to_string()]);
        assert!(mime.is_video());
    }

    #[test]
    fn codecs_absent() {
        let mime = MimeType::new("audio/webm");
        assert!(mime.codecs().is_empty());
        assert!(!mime.is_video());
    }

    #[test]
    fn quoted_codecs_and_spacing() {
        let mime = MimeType::new("audio/ogg; codecs=\"opus\"");
        assert_eq!(mime.container(), "audio/ogg");
        assert_eq!(mime.codecs(), vec!["opus".to_string()]);
    }

    #[test]
    fn file_extensions() {
        assert_eq!(MimeType::new("video/webm;codecs=vp8,opus").file_extension(), "webm");
        assert_eq!(MimeType::new("audio/ogg").file_extension(), "ogg");
        assert_eq!(MimeType::new("audio/mp4").file_extension(), "m4a");
        assert_eq!(MimeType::new("audio/wav").file_extension(), "wav");
        assert_eq!(MimeType::new("audio/mpeg").file_extension(), "mp3");
        assert_eq!(MimeType::new("application/x-unknown").file_extension(), "webm");
    }

    #[test]
    fn platform_default_has_no_mime() {
        assert!(EncodingChoice::PlatformDefault.mime_type().is_none());
        let choice = EncodingChoice::Preferred("audio/webm".into());
        assert_eq!(choice.mime_type().map(MimeType::as_str), Some("audio/webm"));
    }
}
