//! Dashboard aggregates.

use rust_decimal::Decimal;
use sqlx::PgPool;

use delightful_naturals_core::catalog::Product;
use delightful_naturals_core::order::Order;

use super::RepositoryError;

/// Number of recent orders shown on the dashboard.
pub const RECENT_ORDER_LIMIT: i64 = 5;

/// Store-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct StoreTotals {
    /// Sum of totals over orders that were not cancelled.
    pub revenue: Decimal,
    pub order_count: i64,
    pub customer_count: i64,
    pub product_count: i64,
}

/// Repository for dashboard reads.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revenue and entity counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<StoreTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, StoreTotals>(
            r"
            SELECT
                (SELECT COALESCE(SUM(total), 0) FROM customer_order
                 WHERE status <> 'cancelled') AS revenue,
                (SELECT COUNT(*) FROM customer_order) AS order_count,
                (SELECT COUNT(*) FROM customer) AS customer_count,
                (SELECT COUNT(*) FROM product) AS product_count
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(totals)
    }

    /// The most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, number, customer_id, first_name, last_name, email, phone, address, city,
                   province, postal_code, country, payment_method, cardholder_name, card_last4,
                   items, subtotal, total, status, created_at, updated_at
            FROM customer_order
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(RECENT_ORDER_LIMIT)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// Products currently out of stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn out_of_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, size, in_stock, price, blurb, how_to_use, benefits, gallery,
                   rating, reviews, updated_at
            FROM product
            WHERE NOT in_stock
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
