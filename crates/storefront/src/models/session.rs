//! Session-related types.
//!
//! Types stored in the session for authentication, cart and checkout state.

use serde::{Deserialize, Serialize};

use delightful_naturals_core::customer::Customer;
use delightful_naturals_core::{CustomerId, Email};

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Customer's email address.
    pub email: Email,
    /// Name shown in the header.
    pub name: String,
}

impl From<&Customer> for CurrentCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
            name: customer.full_name(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// The logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Cart lines as `(product_id, quantity)` pairs.
    pub const CART: &str = "cart";

    /// Checkout step and collected details.
    pub const CHECKOUT: &str = "checkout";

    /// Number of the order this session just placed, for the confirmation page.
    pub const LAST_ORDER: &str = "last_order";
}
