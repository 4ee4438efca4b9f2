pub mod media;
pub mod storage;

pub use media::{MediaLifecycle, Upload};
pub use storage::{AssetStore, MediaCategory, MediaRef, StorageError};
