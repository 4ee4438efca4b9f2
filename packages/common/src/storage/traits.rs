use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::media_ref::{MediaCategory, MediaRef};

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Persistent storage for uploaded media blobs.
///
/// Blobs are addressed by freshly generated random identifiers, not content:
/// every `store` call produces a new reference, and a reference has exactly
/// one owning record. The store itself knows nothing about layout or
/// ownership.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store a blob under the given category and return its new reference.
    ///
    /// The blob name is a fresh 128-bit random identifier; collisions are
    /// treated as impossible. The write must be durable before the reference
    /// is returned.
    async fn store(
        &self,
        data: &[u8],
        category: MediaCategory,
        extension: &str,
    ) -> Result<MediaRef, StorageError>;

    /// Open a blob as a streaming async reader.
    ///
    /// Fails with [`StorageError::NotFound`] if the blob is absent.
    async fn open(&self, media_ref: &MediaRef) -> Result<BoxReader, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn read(&self, media_ref: &MediaRef) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(media_ref).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Check whether a blob exists.
    async fn exists(&self, media_ref: &MediaRef) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Idempotent: returns `true` if the blob was deleted, `false` if it did
    /// not exist. Deleting a non-existent reference is not an error.
    async fn delete(&self, media_ref: &MediaRef) -> Result<bool, StorageError>;
}
