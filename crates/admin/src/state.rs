//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::media::MediaStore;
use crate::services::LegacyApiClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    legacy: LegacyApiClient,
    media: MediaStore,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool, legacy: LegacyApiClient) -> Self {
        let media = MediaStore::new(config.media_dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                legacy,
                media,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the legacy REST API client.
    #[must_use]
    pub fn legacy(&self) -> &LegacyApiClient {
        &self.inner.legacy
    }

    /// Get the uploaded-media store.
    #[must_use]
    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }
}
