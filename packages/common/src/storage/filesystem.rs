use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::media_ref::{MediaCategory, MediaRef};
use super::traits::{AssetStore, BoxReader};

/// Filesystem-backed asset store.
///
/// Blobs live under one directory per category:
/// `{root}/{category}/{uuid}.{ext}`. Writes stage into `{root}/.tmp` and are
/// fsynced before the rename that makes them visible.
pub struct FilesystemAssetStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemAssetStore {
    /// Create a new store rooted at `root`.
    ///
    /// Creates every category directory and the staging directory. Safe to
    /// call on every process start.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        for category in MediaCategory::ALL {
            fs::create_dir_all(root.join(category.segment())).await?;
        }
        fs::create_dir_all(root.join(".tmp")).await?;
        Ok(Self { root, max_size })
    }

    /// Filesystem path for a reference.
    fn blob_path(&self, media_ref: &MediaRef) -> PathBuf {
        self.root
            .join(media_ref.category().segment())
            .join(media_ref.filename())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl AssetStore for FilesystemAssetStore {
    async fn store(
        &self,
        data: &[u8],
        category: MediaCategory,
        extension: &str,
    ) -> Result<MediaRef, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let id = uuid::Uuid::new_v4();
        let filename = if extension.is_empty() {
            id.to_string()
        } else {
            format!("{id}.{extension}")
        };
        let media_ref = MediaRef::new(category, &filename)?;

        let temp_path = self.temp_path();
        let result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(data).await?;
            // The reference must only become visible once the bytes are
            // durable.
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp_path, self.blob_path(&media_ref)).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(media_ref)
    }

    async fn open(&self, media_ref: &MediaRef) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.blob_path(media_ref)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(media_ref.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, media_ref: &MediaRef) -> Result<bool, StorageError> {
        Ok(fs::try_exists(&self.blob_path(media_ref)).await?)
    }

    async fn delete(&self, media_ref: &MediaRef) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(media_ref)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (FilesystemAssetStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path().join("assets"), 10 * 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn store_read_round_trip() {
        let (store, _dir) = temp_store().await;
        let data = b"original bytes";
        let r = store
            .store(data, MediaCategory::EntryImage, "png")
            .await
            .unwrap();
        assert_eq!(store.read(&r).await.unwrap(), data);
    }

    #[tokio::test]
    async fn store_generates_distinct_refs_for_identical_content() {
        let (store, _dir) = temp_store().await;
        let r1 = store.store(b"same", MediaCategory::Cover, "png").await.unwrap();
        let r2 = store.store(b"same", MediaCategory::Cover, "png").await.unwrap();
        assert_ne!(r1, r2);
        assert!(store.exists(&r1).await.unwrap());
        assert!(store.exists(&r2).await.unwrap());
    }

    #[tokio::test]
    async fn stored_ref_carries_category_and_extension() {
        let (store, _dir) = temp_store().await;
        let r = store
            .store(b"voice note", MediaCategory::EntryAudio, "mp3")
            .await
            .unwrap();
        assert_eq!(r.category(), MediaCategory::EntryAudio);
        assert!(r.to_string().starts_with("media/entryAudio/"));
        assert!(r.to_string().ends_with(".mp3"));
    }

    #[tokio::test]
    async fn size_limit_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemAssetStore::new(dir.path().join("assets"), 10)
            .await
            .unwrap();

        let result = store
            .store(b"this is more than 10 bytes", MediaCategory::Cover, "png")
            .await;
        assert!(matches!(
            result,
            Err(StorageError::SizeLimitExceeded { .. })
        ));

        // Nothing staged, nothing visible.
        let tmp_entries: Vec<_> = std::fs::read_dir(dir.path().join("assets/.tmp"))
            .unwrap()
            .collect();
        assert_eq!(tmp_entries.len(), 0);
        let cover_entries: Vec<_> = std::fs::read_dir(dir.path().join("assets/cover"))
            .unwrap()
            .collect();
        assert_eq!(cover_entries.len(), 0);
    }

    #[tokio::test]
    async fn open_not_found() {
        let (store, _dir) = temp_store().await;
        let missing = MediaRef::parse("media/cover/missing.png").unwrap();
        assert!(matches!(
            store.open(&missing).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.read(&missing).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let (store, _dir) = temp_store().await;
        let r = store
            .store(b"delete me", MediaCategory::Avatar, "jpg")
            .await
            .unwrap();

        assert!(store.delete(&r).await.unwrap());
        assert!(!store.exists(&r).await.unwrap());
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_false() {
        let (store, _dir) = temp_store().await;
        let missing = MediaRef::parse("media/pdf/never-stored.pdf").unwrap();
        assert!(!store.delete(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn extensionless_store_is_allowed() {
        let (store, _dir) = temp_store().await;
        let r = store
            .store(b"raw", MediaCategory::EntryAudio, "")
            .await
            .unwrap();
        assert!(!r.filename().contains('.'));
        assert_eq!(store.read(&r).await.unwrap(), b"raw");
    }

    #[tokio::test]
    async fn constructor_creates_category_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("deep/nested/assets");
        assert!(!root.exists());

        let _store = FilesystemAssetStore::new(root.clone(), 1024).await.unwrap();

        for category in MediaCategory::ALL {
            assert!(root.join(category.segment()).exists());
        }
        assert!(root.join(".tmp").exists());
    }

    #[tokio::test]
    async fn concurrent_stores_do_not_interfere() {
        let (store, _dir) = temp_store().await;
        let store = std::sync::Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..10u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .store(&[i; 16], MediaCategory::EntryImage, "png")
                    .await
            }));
        }

        let mut refs = Vec::new();
        for handle in handles {
            refs.push(handle.await.unwrap().unwrap());
        }

        for (i, r) in refs.iter().enumerate() {
            assert_eq!(store.read(r).await.unwrap(), vec![i as u8; 16]);
        }
    }
}
