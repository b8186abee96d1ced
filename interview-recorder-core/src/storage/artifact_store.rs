use std::fs;
use std::path::{Path, PathBuf};

use crate::models::artifact::{sha256_hex, RecordingArtifact, RecordingMetadata};
use crate::models::error::CaptureError;

/// Write the artifact payload into `directory` under its suggested filename,
/// with a `{name}.metadata.json` sidecar next to it.
///
/// Returns the payload path.
pub fn save_artifact(artifact: &RecordingArtifact, directory: &Path) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(directory)
        .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;

    let recording_path = directory.join(&artifact.suggested_filename);
    fs::write(&recording_path, artifact.payload())
        .map_err(|e| CaptureError::StorageError(format!("failed to write recording: {}", e)))?;

    write_metadata(&artifact.metadata, &recording_path)?;
    log::info!("Saved {} ({} bytes)", recording_path.display(), artifact.metadata.size_bytes);
    Ok(recording_path)
}

/// Write recording metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), CaptureError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(recording_path), json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read recording metadata from its JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}

/// Whether the file on disk still matches the checksum in its sidecar.
pub fn verify_recording(recording_path: &Path) -> Result<bool, CaptureError> {
    let metadata = read_metadata(recording_path)?;
    let data = fs::read(recording_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read recording: {}", e)))?;
    Ok(sha256_hex(&data) == metadata.checksum)
}

fn metadata_path(recording_path: &Path) -> PathBuf {
    let mut name = recording_path.as_os_str().to_owned();
    name.push(".metadata.json");
    PathBuf::from(name)
}
