use std::sync::Arc;

use crate::storage::{AssetStore, MediaCategory, MediaRef, StorageError};

/// An uploaded payload: raw bytes plus the client-declared filename.
#[derive(Clone, Debug)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl Upload {
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }

    /// Extension derived from the declared filename: the last dot-separated
    /// segment. A name without a dot degenerates to the whole name; the
    /// result is not validated.
    pub fn extension(&self) -> &str {
        self.filename.rsplit('.').next().unwrap_or(&self.filename)
    }
}

/// Governs create/replace/delete for every record field that holds a
/// [`MediaRef`].
///
/// The one invariant: a new blob is durably stored before the old one is
/// removed, so a failed write never leaves the record without a resolvable
/// blob.
#[derive(Clone)]
pub struct MediaLifecycle {
    store: Arc<dyn AssetStore>,
}

impl MediaLifecycle {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Replace the blob behind a record field.
    ///
    /// With no upload this is a no-op update and the old reference is
    /// returned unchanged. Otherwise the upload is stored first; only then is
    /// the previous blob deleted. A previous reference that no longer
    /// resolves is tolerated.
    pub async fn replace(
        &self,
        old: Option<&MediaRef>,
        upload: Option<Upload>,
        category: MediaCategory,
    ) -> Result<Option<MediaRef>, StorageError> {
        let Some(upload) = upload else {
            return Ok(old.cloned());
        };

        let new_ref = self
            .store
            .store(&upload.bytes, category, upload.extension())
            .await?;

        if let Some(old) = old
            && *old != new_ref
            && self.store.exists(old).await?
            && !self.store.delete(old).await?
        {
            tracing::warn!(media_ref = %old, "previous blob vanished before delete");
        }

        Ok(Some(new_ref))
    }

    /// Release the blob behind a record field when the owning record is
    /// deleted. Tolerates an already-absent blob.
    pub async fn release(&self, media_ref: Option<&MediaRef>) -> Result<(), StorageError> {
        if let Some(media_ref) = media_ref
            && !self.store.delete(media_ref).await?
        {
            tracing::warn!(%media_ref, "released blob was already absent");
        }
        Ok(())
    }
}
