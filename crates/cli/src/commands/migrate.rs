//! Database migration command.
//!
//! ```bash
//! dn-cli migrate
//! ```
//!
//! Migrations live in `crates/storefront/migrations/` and cover the whole
//! schema: catalog, customers, orders, admin users and content. Sessions
//! tables are created by `tower-sessions-sqlx-store` on first start.

use thiserror::Error;

use super::connect;

/// Errors from running migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply every pending migration.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .map_err(MigrationError::from)?;

    tracing::info!("Migrations complete!");
    Ok(())
}
