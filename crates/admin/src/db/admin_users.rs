//! Admin user repository.

use sqlx::PgPool;

use delightful_naturals_core::{AdminRole, Email};

use super::RepositoryError;
use crate::models::AdminUser;

const ADMIN_USER_COLUMNS: &str = "id, email, name, role, created_at, updated_at";

/// Row joining an admin user with their password hash.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserWithHash {
    #[sqlx(flatten)]
    user: AdminUser,
    password_hash: String,
}

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an admin user and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserWithHash>(&format!(
            "SELECT {ADMIN_USER_COLUMNS}, password_hash FROM admin_user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    /// Create a new admin user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        role: AdminRole,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let user = sqlx::query_as::<_, AdminUser>(&format!(
            r"
            INSERT INTO admin_user (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {ADMIN_USER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "admin email"))?;
        Ok(user)
    }

    /// Replace an admin user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no admin has this email.
    pub async fn set_password_hash(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin_user SET password_hash = $2, updated_at = NOW() WHERE email = $1",
        )
        .bind(email)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Every admin user, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let users = sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin_user ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(users)
    }
}
