use std::sync::Arc;

use memoir_common::{AssetStore, MediaLifecycle};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub assets: Arc<dyn AssetStore>,
    pub lifecycle: MediaLifecycle,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, assets: Arc<dyn AssetStore>, config: AppConfig) -> Self {
        Self {
            db,
            lifecycle: MediaLifecycle::new(assets.clone()),
            assets,
            config: Arc::new(config),
        }
    }
}
