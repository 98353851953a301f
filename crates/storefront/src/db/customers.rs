//! Customer account repository.
//!
//! Customers, their password hashes and their saved addresses.

use sqlx::{PgPool, Postgres, Transaction};

use delightful_naturals_core::customer::{Address, AddressInput, Customer};
use delightful_naturals_core::{AddressId, AddressKind, CustomerId, Email};

use super::RepositoryError;

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, phone, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, customer_id, kind, street, city, province, postal_code, \
                               country, is_default, created_at, updated_at";

/// Profile fields a customer can edit.
#[derive(Debug, Clone, Default)]
pub struct CustomerProfile {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a customer by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(customer)
    }

    /// Create a customer together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        profile: &CustomerProfile,
        password_hash: &str,
    ) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r"
            INSERT INTO customer (email, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(email)
        .bind(profile.first_name.trim())
        .bind(profile.last_name.trim())
        .bind(profile.phone.trim())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email"))?;

        sqlx::query("INSERT INTO customer_password (customer_id, password_hash) VALUES ($1, $2)")
            .bind(customer.id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Get a customer and their password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(Customer, String)>, RepositoryError> {
        let Some(customer) = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM customer_password WHERE customer_id = $1")
                .bind(customer.id)
                .fetch_optional(self.pool)
                .await?;

        Ok(hash.map(|hash| (customer, hash)))
    }

    /// Update profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    pub async fn update_profile(
        &self,
        id: CustomerId,
        profile: &CustomerProfile,
    ) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            r"
            UPDATE customer
            SET first_name = $2, last_name = $3, phone = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(profile.first_name.trim())
        .bind(profile.last_name.trim())
        .bind(profile.phone.trim())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// A customer's saved addresses, defaults first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_addresses(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM customer_address
            WHERE customer_id = $1
            ORDER BY is_default DESC, kind, created_at
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(addresses)
    }

    /// The customer's default address of a kind, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn default_address(
        &self,
        customer_id: CustomerId,
        kind: AddressKind,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM customer_address
            WHERE customer_id = $1 AND kind = $2 AND is_default
            "
        ))
        .bind(customer_id)
        .bind(kind)
        .fetch_optional(self.pool)
        .await?;
        Ok(address)
    }

    /// Save a new address. A new default replaces the previous default of
    /// the same kind.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_address(
        &self,
        customer_id: CustomerId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if input.is_default {
            clear_default(&mut tx, customer_id, input.kind).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            INSERT INTO customer_address
                (customer_id, kind, street, city, province, postal_code, country, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(customer_id)
        .bind(input.kind)
        .bind(input.street.trim())
        .bind(input.city.trim())
        .bind(input.province.trim())
        .bind(input.postal_code.trim())
        .bind(input.country.trim())
        .bind(input.is_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Replace an address owned by the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist or
    /// belongs to someone else.
    pub async fn update_address(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        if input.is_default {
            clear_default(&mut tx, customer_id, input.kind).await?;
        }

        let address = sqlx::query_as::<_, Address>(&format!(
            r"
            UPDATE customer_address
            SET kind = $3, street = $4, city = $5, province = $6, postal_code = $7,
                country = $8, is_default = $9, updated_at = NOW()
            WHERE id = $1 AND customer_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(address_id)
        .bind(customer_id)
        .bind(input.kind)
        .bind(input.street.trim())
        .bind(input.city.trim())
        .bind(input.province.trim())
        .bind(input.postal_code.trim())
        .bind(input.country.trim())
        .bind(input.is_default)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(address)
    }

    /// Delete an address owned by the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete_address(
        &self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM customer_address WHERE id = $1 AND customer_id = $2")
                .bind(address_id)
                .bind(customer_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

async fn clear_default(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: CustomerId,
    kind: AddressKind,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE customer_address SET is_default = FALSE, updated_at = NOW()
        WHERE customer_id = $1 AND kind = $2 AND is_default
        ",
    )
    .bind(customer_id)
    .bind(kind)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
