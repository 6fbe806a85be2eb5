pub mod codec;
pub mod config;
pub mod inference;
pub mod models;
pub mod session;
pub mod store;
pub mod workflows;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use session::SessionManager;
use store::{SqliteStore, StoreError};

/// Initialize tracing for an embedding process. Call once at startup.
pub fn init_telemetry() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}

/// Open the session against the on-disk store at the default location.
pub fn open_session() -> Result<SessionManager, StoreError> {
    let store = SqliteStore::open(&config::store_path())?;
    Ok(SessionManager::load(Arc::new(store)))
}
