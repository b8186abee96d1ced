use crate::models::artifact::Blob;
use crate::models::error::CaptureError;

/// Ephemeral playable URLs over in-memory payloads.
pub trait ObjectUrlRegistry: Send + Sync {
    fn create_object_url(&self, blob: &Blob) -> Result<String, CaptureError>;

    /// Revoking an unknown or already revoked URL is a no-op.
    fn revoke_object_url(&self, url: &str);
}
