//! Order placement and lookup.

use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use delightful_naturals_core::checkout::{CustomerInfo, PaymentDetails, ShippingAddress};
use delightful_naturals_core::order::{Order, OrderItem, OrderNumber};
use delightful_naturals_core::{CustomerId, Email};

use super::RepositoryError;

const ORDER_COLUMNS: &str = "id, number, customer_id, first_name, last_name, email, phone, \
                             address, city, province, postal_code, country, payment_method, \
                             cardholder_name, card_last4, items, subtotal, total, status, \
                             created_at, updated_at";

/// Everything needed to insert an order.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub number: &'a OrderNumber,
    pub customer_id: Option<CustomerId>,
    pub email: &'a Email,
    pub customer: &'a CustomerInfo,
    pub shipping: &'a ShippingAddress,
    pub payment: &'a PaymentDetails,
    pub items: &'a [OrderItem],
    pub subtotal: Decimal,
    pub total: Decimal,
}

/// Repository for storefront order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder<'_>) -> Result<Order, RepositoryError> {
        let created = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO customer_order (
                number, customer_id, first_name, last_name, email, phone,
                address, city, province, postal_code, country,
                payment_method, cardholder_name, card_last4,
                items, subtotal, total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.number)
        .bind(order.customer_id)
        .bind(order.customer.first_name.trim())
        .bind(order.customer.last_name.trim())
        .bind(order.email)
        .bind(order.customer.phone.trim())
        .bind(order.shipping.address.trim())
        .bind(order.shipping.city.trim())
        .bind(order.shipping.province.trim())
        .bind(order.shipping.postal_code.trim())
        .bind(order.shipping.country.trim())
        .bind(order.payment.method)
        .bind(order.payment.cardholder_name.as_deref())
        .bind(order.payment.card_last4.as_deref())
        .bind(Json(order.items))
        .bind(order.subtotal)
        .bind(order.total)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "order number"))?;

        Ok(created)
    }

    /// Look up an order by its customer-facing number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE number = $1"
        ))
        .bind(number)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Orders placed by a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM customer_order WHERE customer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }
}
