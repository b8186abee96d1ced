use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::encoding::MimeType;
use super::mode::CaptureMode;
use crate::traits::object_urls::ObjectUrlRegistry;

/// Immutable binary payload tagged with a MIME type.
///
/// Clones share the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Arc<[u8]>,
    mime_type: MimeType,
}

impl Blob {
    pub fn new(data: Vec<u8>, mime_type: MimeType) -> Self {
        Self {
            data: data.into(),
            mime_type,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// SHA-256 hex digest of the payload.
    pub fn checksum(&self) -> String {
        sha256_hex(&self.data)
    }
}

/// Finished recording handed to the caller on a successful stop.
///
/// The caller owns `playable_url` and should call [`RecordingArtifact::release`]
/// once the recording is no longer displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingArtifact {
    pub blob: Blob,
    pub playable_url: String,
    pub suggested_filename: String,
    pub metadata: RecordingMetadata,
}

impl RecordingArtifact {
    pub fn payload(&self) -> &[u8] {
        self.blob.bytes()
    }

    pub fn mime_type(&self) -> &MimeType {
        self.blob.mime_type()
    }

    /// Revoke the playable URL. The payload stays usable.
    pub fn release(&self, urls: &dyn ObjectUrlRegistry) {
        urls.revoke_object_url(&self.playable_url);
    }
}

/// Serializable description of a recording, without the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub filename: String,
    pub mime_type: MimeType,
    pub mode: CaptureMode,
    pub duration_secs: f64,
    pub size_bytes: u64,
    pub chunk_count: usize,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl RecordingMetadata {
    pub fn new(
        blob: &Blob,
        filename: &str,
        mode: CaptureMode,
        duration_secs: f64,
        chunk_count: usize,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            mime_type: blob.mime_type().clone(),
            mode,
            duration_secs,
            size_bytes: blob.len() as u64,
            chunk_count,
            checksum: blob.checksum(),
            created_at,
        }
    }
}

/// SHA-256 hex digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// `<prefix>-<unix millis>.<ext>`, extension taken from the container.
pub fn suggested_filename(prefix: &str, created_at: DateTime<Utc>, mime_type: &MimeType) -> String {
    format!(
        "{}-{}.{}",
        prefix,
        created_at.timestamp_millis(),
        mime_type.file_extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn checksum_of_known_payload() {
        let blob = Blob::new(b"abc".to_vec(), "audio/webm".into());
        assert_eq!(
            blob.checksum(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn clones_share_bytes() {
        let blob = Blob::new(vec![1, 2, 3], "audio/webm".into());
        let clone = blob.clone();
        assert!(std::ptr::eq(blob.bytes().as_ptr(), clone.bytes().as_ptr()));
    }

    #[test]
    fn filename_uses_millis_and_extension() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let name = suggested_filename("audio", at, &"video/webm;codecs=vp9,opus".into());
        assert_eq!(name, "audio-1700000000123.webm");

        let name = suggested_filename("interview", at, &"audio/wav".into());
        assert_eq!(name, "interview-1700000000123.wav");
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let blob = Blob::new(vec![0u8; 10], "audio/ogg".into());
        let at = Utc.timestamp_millis_opt(1_000).unwrap();
        let metadata = RecordingMetadata::new(&blob, "audio-1000.ogg", CaptureMode::Mixed, 1.5, 2, at);

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"mode\":\"mixed\""));
        let parsed: RecordingMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
        assert_eq!(parsed.size_bytes, 10);
    }
}
