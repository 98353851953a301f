//! Storefront customer accounts and their saved addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::{CheckoutError, DEFAULT_COUNTRY, ShippingAddress};
use crate::types::{AddressId, AddressKind, CustomerId, Email};

/// A registered storefront customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.to_string()
        } else {
            name.to_string()
        }
    }
}

/// A saved shipping or billing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub kind: AddressKind,
    pub street: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Single-line rendering for lists.
    #[must_use]
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}",
            self.street, self.city, self.province, self.postal_code, self.country
        )
    }
}

/// Fields a customer submits when saving an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressInput {
    pub kind: AddressKind,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Trim every field, default the country, then apply the same rules as
    /// the checkout shipping step.
    ///
    /// # Errors
    ///
    /// Returns the first missing field or an unknown province.
    pub fn normalize_and_validate(&mut self) -> Result<(), CheckoutError> {
        for field in [
            &mut self.street,
            &mut self.city,
            &mut self.province,
            &mut self.postal_code,
            &mut self.country,
        ] {
            *field = field.trim().to_string();
        }
        if self.country.is_empty() {
            self.country = DEFAULT_COUNTRY.to_string();
        }
        ShippingAddress::from(&*self).validate()
    }
}

impl From<&AddressInput> for ShippingAddress {
    fn from(input: &AddressInput) -> Self {
        Self {
            address: input.street.clone(),
            city: input.city.clone(),
            province: input.province.clone(),
            postal_code: input.postal_code.clone(),
            country: input.country.clone(),
        }
    }
}

impl From<&Address> for ShippingAddress {
    fn from(address: &Address) -> Self {
        Self {
            address: address.street.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_falls_back_to_email() {
        let now = Utc::now();
        let mut customer = Customer {
            id: CustomerId::new(1),
            email: Email::parse("lindiwe@example.com").unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(customer.full_name(), "lindiwe@example.com");

        customer.first_name = "Lindiwe".to_string();
        assert_eq!(customer.full_name(), "Lindiwe");
    }

    #[test]
    fn test_address_input_defaults_country_and_trims() {
        let mut input = AddressInput {
            kind: AddressKind::Shipping,
            street: " 12 Long Street ".to_string(),
            city: "Cape Town".to_string(),
            province: "Western Cape".to_string(),
            postal_code: "8001".to_string(),
            country: "  ".to_string(),
            is_default: true,
        };
        input.normalize_and_validate().unwrap();
        assert_eq!(input.street, "12 Long Street");
        assert_eq!(input.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn test_address_input_rejects_unknown_province() {
        let mut input = AddressInput {
            street: "1 Main Road".to_string(),
            city: "Durban".to_string(),
            province: "Natal".to_string(),
            postal_code: "4001".to_string(),
            ..AddressInput::default()
        };
        assert!(matches!(
            input.normalize_and_validate(),
            Err(CheckoutError::UnknownProvince(_))
        ));
    }
}
