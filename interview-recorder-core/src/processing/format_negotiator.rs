use std::time::Duration;

use crate::models::encoding::{EncodingChoice, MimeType};
use crate::models::error::CaptureError;
use crate::models::media_stream::MediaStream;
use crate::traits::media_encoder::{EncoderOptions, MediaEncoder, MediaEncoderFactory};

/// Return the first preferred type the host supports, in list order.
pub fn pick_encoding(encoders: &dyn MediaEncoderFactory, preferred: &[MimeType]) -> EncodingChoice {
    match preferred.iter().find(|mime| encoders.is_type_supported(mime)) {
        Some(mime) => {
            log::debug!("Negotiated encoding {}", mime);
            EncodingChoice::Preferred(mime.clone())
        }
        None => {
            log::info!(
                "None of {} preferred encodings supported, using encoder default",
                preferred.len()
            );
            EncodingChoice::PlatformDefault
        }
    }
}

/// Build the encoder for `stream`.
///
/// If the host rejects the negotiated type at construction time, retry once
/// with no options at all. Only the second failure is reported.
pub fn create_encoder(
    encoders: &dyn MediaEncoderFactory,
    stream: &MediaStream,
    choice: &EncodingChoice,
    timeslice: Option<Duration>,
) -> Result<Box<dyn MediaEncoder>, CaptureError> {
    let options = EncoderOptions {
        mime_type: choice.mime_type().cloned(),
        timeslice,
    };

    match encoders.create(stream, &options) {
        Ok(encoder) => Ok(encoder),
        Err(e) if options != EncoderOptions::default() => {
            log::warn!("Encoder rejected {:?}: {}; retrying with defaults", options, e);
            encoders.create(stream, &EncoderOptions::default())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::DEFAULT_PREFERRED_MIME_TYPES;
    use crate::traits::media_encoder::EncoderEventSink;
    use parking_lot::Mutex;

    struct Encoder(Option<MimeType>);

    impl MediaEncoder for Encoder {
        fn mime_type(&self) -> Option<MimeType> {
            self.0.clone()
        }

        fn start(&mut self, _sink: EncoderEventSink) -> Result<(), CaptureError> {
            Ok(())
        }

        fn request_stop(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }

    struct Factory {
        supported: Vec<&'static str>,
        reject_options: bool,
        created_with: Mutex<Vec<EncoderOptions>>,
    }

    impl Factory {
        fn new(supported: Vec<&'static str>) -> Self {
            Self {
                supported,
                reject_options: false,
                created_with: Mutex::new(Vec::new()),
            }
        }
    }

    impl MediaEncoderFactory for Factory {
        fn is_type_supported(&self, mime_type: &MimeType) -> bool {
            self.supported.contains(&mime_type.as_str())
        }

        fn create(&self, _stream: &MediaStream, options: &EncoderOptions) -> Result<Box<dyn MediaEncoder>, CaptureError> {
            self.created_with.lock().push(options.clone());
            if self.reject_options && options.mime_type.is_some() {
                return Err(CaptureError::EncodingFailed("unsupported".into()));
            }
            Ok(Box::new(Encoder(options.mime_type.clone())))
        }
    }

    fn preferred() -> Vec<MimeType> {
        DEFAULT_PREFERRED_MIME_TYPES.iter().map(|m| MimeType::new(*m)).collect()
    }

    fn stream() -> MediaStream {
        MediaStream::new("s", Vec::new())
    }

    #[test]
    fn picks_first_supported_in_order() {
        let factory = Factory::new(vec!["audio/webm", "video/webm;codecs=vp8,opus"]);
        let choice = pick_encoding(&factory, &preferred());
        assert_eq!(choice, EncodingChoice::Preferred("video/webm;codecs=vp8,opus".into()));
    }

    #[test]
    fn audio_only_host() {
        let factory = Factory::new(vec!["audio/webm;codecs=opus", "audio/webm"]);
        let choice = pick_encoding(&factory, &preferred());
        assert_eq!(choice, EncodingChoice::Preferred("audio/webm;codecs=opus".into()));
    }

    #[test]
    fn nothing_supported_uses_default() {
        let factory = Factory::new(vec!["audio/wav"]);
        assert_eq!(pick_encoding(&factory, &preferred()), EncodingChoice::PlatformDefault);
        assert_eq!(pick_encoding(&factory, &[]), EncodingChoice::PlatformDefault);
    }

    #[test]
    fn default_choice_constructs_without_options() {
        let factory = Factory::new(vec![]);
        let encoder = create_encoder(&factory, &stream(), &EncodingChoice::PlatformDefault, None).unwrap();
        assert!(encoder.mime_type().is_none());
        assert_eq!(*factory.created_with.lock(), vec![EncoderOptions::default()]);
    }

    #[test]
    fn rejected_type_falls_back_to_bare_construction() {
        let factory = Factory {
            reject_options: true,
            ..Factory::new(vec!["audio/webm"])
        };
        let choice = EncodingChoice::Preferred("audio/webm".into());

        let encoder = create_encoder(&factory, &stream(), &choice, None).unwrap();

        assert!(encoder.mime_type().is_none());
        let calls = factory.created_with.lock();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].mime_type, Some("audio/webm".into()));
        assert_eq!(calls[1], EncoderOptions::default());
    }
}
