mod error;
mod media_ref;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use media_ref::{MediaCategory, MediaRef, MediaRefError};
pub use traits::{AssetStore, BoxReader};
