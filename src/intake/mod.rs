use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Extensions the upload control accepts. Checked case-insensitively before
/// any disk write or remote call.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "webm"];

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("unsupported audio extension '{0}'; accepted: mp3, wav, m4a, flac, webm")]
    UnsupportedExtension(String),
    #[error("could not store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored upload: where the bytes landed, and the name to show the user.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub file_name: String,
}

/// Writes uploads into a flat directory, created on demand. Storage names
/// are generated, never taken from the client, so a hostile file name cannot
/// escape the directory or overwrite an earlier upload.
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Extension check, usable before the bytes are read.
    pub fn accepted_extension(original_name: &str) -> Result<String, IntakeError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(IntakeError::UnsupportedExtension(extension))
        }
    }

    pub fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload, IntakeError> {
        let extension = Self::accepted_extension(original_name)?;
        std::fs::create_dir_all(&self.root)?;

        let path = self.root.join(format!("{}.{}", Uuid::new_v4(), extension));
        std::fs::write(&path, bytes)?;

        Ok(StoredUpload {
            path,
            file_name: original_name.to_string(),
        })
    }
}
