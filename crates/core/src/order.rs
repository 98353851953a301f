//! Placed orders.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::types::{
    CustomerId, Email, OrderId, OrderStatus, PaymentMethodKind, Price, ProductId, format_zar,
};

/// Characters an order number is drawn from.
pub const ORDER_NUMBER_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Length of a customer-facing order number.
pub const ORDER_NUMBER_LENGTH: usize = 9;

/// Error returned when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("order numbers are {ORDER_NUMBER_LENGTH} upper-case letters or digits")]
pub struct OrderNumberError;

/// The customer-facing reference for an order, e.g. `K3Q9ZX0AB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Parse an order number. Lower-case input is upper-cased first.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError`] unless the input is exactly
    /// [`ORDER_NUMBER_LENGTH`] characters from [`ORDER_NUMBER_ALPHABET`].
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let s = s.trim().to_ascii_uppercase();
        if s.len() == ORDER_NUMBER_LENGTH && s.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b)) {
            Ok(Self(s))
        } else {
            Err(OrderNumberError)
        }
    }

    /// Build an order number from alphabet positions. Each index is taken
    /// modulo the alphabet size.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // reduced modulo the alphabet length
    pub fn from_indices(indices: [usize; ORDER_NUMBER_LENGTH]) -> Self {
        let s = indices
            .iter()
            .map(|i| char::from(ORDER_NUMBER_ALPHABET[i % ORDER_NUMBER_ALPHABET.len()]))
            .collect();
        Self(s)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// A product line frozen at the moment the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        Price::zar(self.unit_price).times(self.quantity).amount
    }
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            name: line.product.name.clone(),
            size: line.product.size.clone(),
            unit_price: line.product.price,
            quantity: line.quantity,
        }
    }
}

/// Snapshot every cart line as an order item.
#[must_use]
pub fn order_items(cart: &Cart) -> Vec<OrderItem> {
    cart.lines().iter().map(OrderItem::from).collect()
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    pub number: OrderNumber,
    pub customer_id: Option<CustomerId>,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub payment_method: PaymentMethodKind,
    pub cardholder_name: Option<String>,
    pub card_last4: Option<String>,
    #[cfg_attr(feature = "postgres", sqlx(json))]
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn display_total(&self) -> String {
        format_zar(self.total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::{CartAction, CartProduct};

    #[test]
    fn test_parse_order_number() {
        assert_eq!(OrderNumber::parse("k3q9zx0ab").unwrap().as_str(), "K3Q9ZX0AB");
        assert!(OrderNumber::parse("SHORT").is_err());
        assert!(OrderNumber::parse("K3Q9ZX0A!").is_err());
        assert!(OrderNumber::parse("K3Q9ZX0ABC").is_err());
    }

    #[test]
    fn test_from_indices_wraps() {
        let number = OrderNumber::from_indices([0, 1, 2, 10, 35, 36, 37, 71, 9]);
        assert_eq!(number.as_str(), "012AZ01Z9");
        assert!(OrderNumber::parse(number.as_str()).is_ok());
    }

    #[test]
    fn test_order_items_snapshot_cart() {
        let mut cart = Cart::new();
        cart.apply(CartAction::Add {
            product: CartProduct {
                id: ProductId::parse("detox-60").unwrap(),
                name: "Detox".to_string(),
                size: "60ml".to_string(),
                price: Decimal::from(300),
                image: None,
                in_stock: true,
            },
            quantity: 2,
        });

        let items = order_items(&cart);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].line_total(), Decimal::from(600));
        let sum: Decimal = items.iter().map(OrderItem::line_total).sum();
        assert_eq!(sum, cart.total());
    }
}
