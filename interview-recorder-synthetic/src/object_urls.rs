use std::collections::HashMap;

use interview_recorder_core::{Blob, CaptureError, ObjectUrlRegistry};
use parking_lot::Mutex;
use uuid::Uuid;

/// In-memory `blob:` URL table.
#[derive(Default)]
pub struct InMemoryObjectUrls {
    urls: Mutex<HashMap<String, Blob>>,
}

impl InMemoryObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.urls.lock().get(url).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.urls.lock().len()
    }
}

impl ObjectUrlRegistry for InMemoryObjectUrls {
    fn create_object_url(&self, blob: &Blob) -> Result<String, CaptureError> {
        let url = format!("blob:synthetic/{}", Uuid::new_v4());
        self.urls.lock().insert(url.clone(), blob.clone());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if self.urls.lock().remove(url).is_none() {
            log::debug!("Revoking unknown object URL {}", url);
        }
    }
}
