//! Admin user management commands.
//!
//! Passwords are read from the first line of stdin so they never appear in
//! shell history or the process list.

use std::str::FromStr;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use delightful_naturals_admin::db::AdminUserRepository;
use delightful_naturals_admin::services::AdminAuthService;
use delightful_naturals_core::{AdminRole, Email};

use super::connect;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Nothing on stdin.
    #[error("No password given on stdin")]
    MissingPassword,
}

/// Parse the role name accepted by `--role`.
fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    AdminRole::from_str(role).map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// Read one line from stdin, without its line ending.
async fn read_password() -> Result<String, Box<dyn std::error::Error>> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let password = line.trim_end_matches(['\r', '\n']).to_owned();
    if password.is_empty() {
        return Err(AdminError::MissingPassword.into());
    }
    Ok(password)
}

/// Create a new admin user with a password read from stdin.
///
/// # Errors
///
/// Returns an error for an invalid role or email, a short password, an
/// existing account or a database failure.
pub async fn create_user(email: &str, name: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let role = parse_role(role)?;
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let password = read_password().await?;

    let pool = connect().await?;
    let user = AdminAuthService::new(&pool)
        .create_user(&email, name, role, &password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Log every admin user.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub async fn list_users() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let users = AdminUserRepository::new(&pool).list().await?;

    tracing::info!("{} admin user(s)", users.len());
    for user in users {
        tracing::info!("  {} {} <{}> {}", user.id, user.name, user.email, user.role);
    }
    Ok(())
}

/// Replace an admin user's password with one read from stdin.
///
/// # Errors
///
/// Returns an error for an invalid email, a short password, an unknown
/// account or a database failure.
pub async fn reset_password(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let password = read_password().await?;

    let pool = connect().await?;
    AdminAuthService::new(&pool)
        .reset_password(&email, &password)
        .await?;

    tracing::info!("Password updated for {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("viewer").ok(), Some(AdminRole::Viewer));
        assert_eq!(parse_role("super_admin").ok(), Some(AdminRole::SuperAdmin));
        assert!(matches!(parse_role("root"), Err(AdminError::InvalidRole(r)) if r == "root"));
    }
}
