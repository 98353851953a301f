//! Admin user domain types.

use chrono::{DateTime, Utc};

use delightful_naturals_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use delightful_naturals_core::AdminRole;

/// A back-office user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role/permission level.
    pub role: AdminRole,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}
