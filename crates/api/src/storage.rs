//! Artifact storage.
//!
//! Exported report bytes are handed to an [`ArtifactStorage`] sink which
//! returns a stable reference (path or URL); run records persist the
//! reference, never the bytes. The production implementation writes to a
//! local directory.

use std::path::PathBuf;

use async_trait::async_trait;

/// Errors writing an artifact to storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Artifact storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores artifact bytes under a filename and returns a reference to them.
#[async_trait]
pub trait ArtifactStorage: Send + Sync {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// Writes artifacts into a local directory, creating it on first use.
/// The returned reference is the public `/exports/...` path the artifact
/// is served under.
pub struct LocalArtifactStorage {
    root: PathBuf,
}

impl LocalArtifactStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl ArtifactStorage for LocalArtifactStorage {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(filename);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Artifact stored");
        Ok(format!("/exports/{filename}"))
    }
}
