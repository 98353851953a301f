//! Order management.

use sqlx::PgPool;

use delightful_naturals_core::order::Order;
use delightful_naturals_core::{CustomerId, OrderId, OrderStatus};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, number, customer_id, first_name, last_name, email, phone, \
                             address, city, province, postal_code, country, payment_method, \
                             cardholder_name, card_last4, items, subtotal, total, status, \
                             created_at, updated_at";

/// Filters for the order list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    /// Free text matched against the order number, customer name and email.
    pub query: Option<String>,
    /// Only orders with this status.
    pub status: Option<OrderStatus>,
}

/// Escape `LIKE` wildcards and wrap the term for a substring match.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders matching the filter, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        limit: i64,
    ) -> Result<Vec<Order>, RepositoryError> {
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(contains_pattern);

        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM customer_order
            WHERE ($1::order_status IS NULL OR status = $1)
              AND ($2::text IS NULL
                   OR number ILIKE $2
                   OR email ILIKE $2
                   OR (first_name || ' ' || last_name) ILIKE $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "
        ))
        .bind(filter.status)
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Number of orders in each status. Statuses with no orders are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_counts(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let counts = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM customer_order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(counts)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Orders linked to a storefront account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM customer_order
            WHERE customer_id = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Set an order's status exactly as requested.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE customer_order
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("AB12"), "%AB12%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
