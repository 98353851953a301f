//! Order placement.
//!
//! Turns a reviewed checkout and a non-empty cart into a persisted order.
//! The caller clears the cart and resets checkout only after this succeeds.

use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;

use delightful_naturals_core::cart::Cart;
use delightful_naturals_core::checkout::{CheckoutError, CheckoutState};
use delightful_naturals_core::order::{
    ORDER_NUMBER_ALPHABET, ORDER_NUMBER_LENGTH, Order, OrderNumber, order_items,
};
use delightful_naturals_core::{CustomerId, Email, EmailError};

use crate::db::{NewOrder, OrderRepository, RepositoryError};

/// Attempts at finding an unused order number before giving up.
const MAX_NUMBER_ATTEMPTS: usize = 3;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// Checkout is incomplete, or the cart is empty or too large.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The stored checkout email no longer parses.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// Insert failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Generate a random 9-character order number.
#[must_use]
pub fn generate_order_number() -> OrderNumber {
    let mut rng = rand::rng();
    let indices: [usize; ORDER_NUMBER_LENGTH] =
        std::array::from_fn(|_| rng.random_range(0..ORDER_NUMBER_ALPHABET.len()));
    OrderNumber::from_indices(indices)
}

/// Persist the order described by `checkout` and `cart`.
///
/// Retries with a fresh number when the generated one collides.
///
/// # Errors
///
/// Returns `PlaceOrderError::Checkout` when checkout is not at review, the
/// cart is empty or its total exceeds what an order can store, and
/// `PlaceOrderError::Repository` if the insert fails.
#[tracing::instrument(skip_all, fields(items = cart.item_count()))]
pub async fn place_order(
    pool: &PgPool,
    checkout: &CheckoutState,
    cart: &Cart,
    customer_id: Option<CustomerId>,
) -> Result<Order, PlaceOrderError> {
    let payment = checkout.ready_to_place(cart)?;
    let email = Email::parse(&checkout.customer.email)?;
    let items = order_items(cart);
    let subtotal = cart.total();
    let repo = OrderRepository::new(pool);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let number = generate_order_number();
        let new_order = NewOrder {
            number: &number,
            customer_id,
            email: &email,
            customer: &checkout.customer,
            shipping: &checkout.shipping,
            payment,
            items: &items,
            subtotal,
            total: subtotal,
        };

        match repo.create(&new_order).await {
            Ok(order) => {
                tracing::info!(order_number = %order.number, total = %order.total, "Order placed");
                return Ok(order);
            }
            Err(RepositoryError::Conflict(_)) if attempt < MAX_NUMBER_ATTEMPTS => {
                tracing::warn!(order_number = %number, attempt, "Order number collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_numbers_are_valid() {
        for _ in 0..50 {
            let number = generate_order_number();
            assert!(OrderNumber::parse(number.as_str()).is_ok());
            assert_eq!(number.as_str().len(), ORDER_NUMBER_LENGTH);
        }
    }
}
