use std::net::SocketAddr;
use std::sync::Arc;

use memoir_common::storage::filesystem::FilesystemAssetStore;
use memoir_server::config::AppConfig;
use memoir_server::state::AppState;
use memoir_server::{build_router, database};
use tracing::{Level, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;

    // Idempotent startup: creates the category directories on every boot.
    let assets = Arc::new(
        FilesystemAssetStore::new(config.storage.root.clone(), config.storage.max_blob_size)
            .await?,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(db, assets, config);
    let app = build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
