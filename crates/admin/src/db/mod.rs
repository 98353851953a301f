//! Database operations for admin.
//!
//! The admin shares one `PostgreSQL` database with the storefront and owns
//! every write to the catalog and content tables.
//!
//! ## Tables
//!
//! - `admin_user` - Back-office users (Argon2 password hashes)
//! - `product`, `product_image` - Catalog, written by the product editor
//! - `customer_order` - Orders (status updates)
//! - `customer`, `customer_address` - Storefront accounts (read-only here)
//! - `testimonial`, `journal_post` - Editorial content
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p delightful-naturals-cli -- migrate
//! ```

pub mod admin_users;
pub mod customers;
pub mod dashboard;
pub mod journal;
pub mod orders;
pub mod products;
pub mod testimonials;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use customers::CustomerRepository;
pub use dashboard::DashboardRepository;
pub use journal::JournalRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use testimonials::TestimonialRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn from_unique(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
