//! Authentication service.
//!
//! Password registration and login for storefront customers.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use delightful_naturals_core::customer::Customer;
use delightful_naturals_core::{CustomerId, Email};

use crate::db::RepositoryError;
use crate::db::customers::{CustomerProfile, CustomerRepository};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration form input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub profile: CustomerProfile,
}

/// Authentication service.
pub struct AuthService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Register a new customer with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::MissingField` if a name is empty.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::CustomerAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: &Registration) -> Result<Customer, AuthError> {
        let email = Email::parse(&registration.email)?;
        validate_profile(&registration.profile)?;
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;

        self.customers
            .create_with_password(&email, &registration.profile, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::CustomerAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Customer, AuthError> {
        let email = Email::parse(email)?;

        let (customer, password_hash) = self
            .customers
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(customer)
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CustomerNotFound` if the customer doesn't exist.
    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, AuthError> {
        self.customers
            .get_by_id(id)
            .await?
            .ok_or(AuthError::CustomerNotFound)
    }
}

/// Names are required on registration; phone is optional.
fn validate_profile(profile: &CustomerProfile) -> Result<(), AuthError> {
    if profile.first_name.trim().is_empty() {
        return Err(AuthError::MissingField("first name"));
    }
    if profile.last_name.trim().is_empty() {
        return Err(AuthError::MissingField("last name"));
    }
    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("rooibos1").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("shea-butter-42").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("shea-butter-42", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong-password", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_profile_requires_names() {
        let mut profile = CustomerProfile::default();
        assert!(matches!(
            validate_profile(&profile),
            Err(AuthError::MissingField("first name"))
        ));
        profile.first_name = "Thandi".to_string();
        profile.last_name = "Mokoena".to_string();
        assert!(validate_profile(&profile).is_ok());
    }
}
