//! Storefront accounts, read-only from the back-office.

use rust_decimal::Decimal;
use sqlx::PgPool;

use delightful_naturals_core::CustomerId;
use delightful_naturals_core::customer::{Address, Customer};

use super::RepositoryError;
use super::orders::contains_pattern;

const CUSTOMER_COLUMNS: &str = "id, email, first_name, last_name, phone, created_at, updated_at";

const ADDRESS_COLUMNS: &str = "id, customer_id, kind, street, city, province, postal_code, \
                               country, is_default, created_at, updated_at";

/// A customer with their order totals, for the customer list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerSummary {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub order_count: i64,
    /// Sum of totals over orders that were not cancelled.
    pub lifetime_spend: Decimal,
}

/// Repository for customer reads.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Customers newest first, optionally filtered by name or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        query: Option<&str>,
        limit: i64,
    ) -> Result<Vec<CustomerSummary>, RepositoryError> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(contains_pattern);

        let rows = sqlx::query_as::<_, CustomerSummary>(
            r"
            SELECT c.id, c.email, c.first_name, c.last_name, c.phone, c.created_at, c.updated_at,
                   COUNT(o.id) AS order_count,
                   COALESCE(SUM(o.total) FILTER (WHERE o.status <> 'cancelled'), 0)
                       AS lifetime_spend
            FROM customer c
            LEFT JOIN customer_order o ON o.customer_id = c.id
            WHERE $1::text IS NULL
               OR c.email ILIKE $1
               OR (c.first_name || ' ' || c.last_name) ILIKE $1
            GROUP BY c.id
            ORDER BY c.created_at DESC, c.id DESC
            LIMIT $2
            ",
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// A single customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(customer)
    }

    /// A customer's saved addresses, defaults first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn addresses(&self, id: CustomerId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM customer_address
            WHERE customer_id = $1
            ORDER BY kind, is_default DESC, id
            "
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(addresses)
    }
}
