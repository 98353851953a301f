//! The four-step checkout flow.
//!
//! [`CheckoutState`] holds the current [`CheckoutStep`] and whatever the
//! customer has entered so far. Each `submit_*` method stores the submitted
//! form, validates it and advances one step only when validation passes, so
//! a failed submission leaves the customer on the same step with their input
//! intact for re-rendering.
//!
//! Full card numbers and CVVs never reach the state: [`PaymentInput`] is
//! reduced to [`PaymentDetails`] (method, cardholder, last four digits)
//! during validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::types::{Email, EmailError, PaymentMethodKind};

/// Country used when the shipping form leaves it blank.
pub const DEFAULT_COUNTRY: &str = "South Africa";

/// Largest order total the orders table can store (`NUMERIC(12,2)`).
// 9_999_999_999.99 (999_999_999_999 at scale 2); `Decimal::new` is not const.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Provinces accepted on the shipping form.
pub const SOUTH_AFRICAN_PROVINCES: [&str; 9] = [
    "Eastern Cape",
    "Free State",
    "Gauteng",
    "KwaZulu-Natal",
    "Limpopo",
    "Mpumalanga",
    "Northern Cape",
    "North West",
    "Western Cape",
];

/// Why a checkout step could not be completed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("unknown province: {0}")]
    UnknownProvince(String),
    #[error("card number must be 12 to 19 digits")]
    InvalidCardNumber,
    #[error("expected the {expected} step, but checkout is at {actual}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
    #[error("your cart is empty")]
    EmptyCart,
    #[error("review your order before placing it")]
    NotAtReview,
    #[error("order total is too large to place online")]
    TotalTooLarge,
}

/// A screen in the checkout wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    CustomerInfo,
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    pub const ALL: [Self; 4] = [Self::CustomerInfo, Self::Shipping, Self::Payment, Self::Review];

    /// One-based position, as shown in the step indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::CustomerInfo => 1,
            Self::Shipping => 2,
            Self::Payment => 3,
            Self::Review => 4,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CustomerInfo => "Customer Info",
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }

    /// The following step; `Review` is terminal.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::CustomerInfo => Self::Shipping,
            Self::Shipping => Self::Payment,
            Self::Payment | Self::Review => Self::Review,
        }
    }

    /// The preceding step; `CustomerInfo` is the floor.
    #[must_use]
    pub const fn previous(self) -> Self {
        match self {
            Self::CustomerInfo | Self::Shipping => Self::CustomerInfo,
            Self::Payment => Self::Shipping,
            Self::Review => Self::Payment,
        }
    }
}

impl std::fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn require(value: &str, field: &'static str) -> Result<(), CheckoutError> {
    if value.trim().is_empty() {
        Err(CheckoutError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Step 1: who is ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl CustomerInfo {
    /// # Errors
    ///
    /// Returns the first missing field, or an invalid email.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        require(&self.first_name, "first name")?;
        require(&self.last_name, "last name")?;
        require(&self.email, "email")?;
        require(&self.phone, "phone number")?;
        Email::parse(&self.email)?;
        Ok(())
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Step 2: where to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            address: String::new(),
            city: String::new(),
            province: String::new(),
            postal_code: String::new(),
            country: default_country(),
        }
    }
}

impl ShippingAddress {
    /// # Errors
    ///
    /// Returns the first missing field, or a province outside
    /// [`SOUTH_AFRICAN_PROVINCES`].
    pub fn validate(&self) -> Result<(), CheckoutError> {
        require(&self.address, "street address")?;
        require(&self.city, "city")?;
        require(&self.province, "province")?;
        require(&self.postal_code, "postal code")?;
        let province = self.province.trim();
        if !SOUTH_AFRICAN_PROVINCES.contains(&province) {
            return Err(CheckoutError::UnknownProvince(province.to_string()));
        }
        Ok(())
    }

    /// Fill in the default country when the form left it blank.
    fn normalize(&mut self) {
        if self.country.trim().is_empty() {
            self.country = default_country();
        }
    }
}

/// Step 3 as submitted. Never stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInput {
    pub method: PaymentMethodKind,
    #[serde(default)]
    pub cardholder_name: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvv: String,
}

impl PaymentInput {
    /// Validate and reduce to what may be kept.
    ///
    /// # Errors
    ///
    /// For card payments, returns the first missing field or
    /// [`CheckoutError::InvalidCardNumber`].
    pub fn into_details(self) -> Result<PaymentDetails, CheckoutError> {
        match self.method {
            PaymentMethodKind::Card => {
                require(&self.card_number, "card number")?;
                require(&self.expiry_date, "expiry date")?;
                require(&self.cvv, "CVV")?;
                require(&self.cardholder_name, "cardholder name")?;

                let digits: String = self
                    .card_number
                    .chars()
                    .filter(|c| !matches!(c, ' ' | '-'))
                    .collect();
                if !(12..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit())
                {
                    return Err(CheckoutError::InvalidCardNumber);
                }

                let last4 = digits
                    .get(digits.len() - 4..)
                    .ok_or(CheckoutError::InvalidCardNumber)?;

                Ok(PaymentDetails {
                    method: PaymentMethodKind::Card,
                    cardholder_name: Some(self.cardholder_name.trim().to_string()),
                    card_last4: Some(last4.to_string()),
                })
            }
            method @ (PaymentMethodKind::Eft | PaymentMethodKind::Cash) => Ok(PaymentDetails {
                method,
                cardholder_name: None,
                card_last4: None,
            }),
        }
    }
}

/// Step 3 as retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethodKind,
    pub cardholder_name: Option<String>,
    pub card_last4: Option<String>,
}

/// Checkout progress and collected details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutState {
    pub step: CheckoutStep,
    pub customer: CustomerInfo,
    pub shipping: ShippingAddress,
    pub payment: Option<PaymentDetails>,
}

impl CheckoutState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Store customer info and advance to shipping if it validates.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside step 1, or the
    /// validation failure.
    pub fn submit_customer(&mut self, info: CustomerInfo) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::CustomerInfo)?;
        self.customer = info;
        self.customer.validate()?;
        self.step = self.step.next();
        Ok(())
    }

    /// Store the shipping address and advance to payment if it validates.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside step 2, or the
    /// validation failure.
    pub fn submit_shipping(&mut self, mut address: ShippingAddress) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Shipping)?;
        address.normalize();
        self.shipping = address;
        self.shipping.validate()?;
        self.step = self.step.next();
        Ok(())
    }

    /// Validate payment and advance to review.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside step 3, or the
    /// validation failure. Nothing is stored on failure.
    pub fn submit_payment(&mut self, input: PaymentInput) -> Result<(), CheckoutError> {
        self.expect_step(CheckoutStep::Payment)?;
        let details = input.into_details()?;
        self.payment = Some(details);
        self.step = self.step.next();
        Ok(())
    }

    /// Go back one step, never below the first.
    pub fn back(&mut self) {
        self.step = self.step.previous();
    }

    /// Forget everything and return to step 1.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check that an order may be placed for `cart`.
    ///
    /// # Errors
    ///
    /// Fails unless checkout is at review, every step still validates and
    /// the cart has at least one line with a total no larger than
    /// [`MAX_ORDER_TOTAL`].
    pub fn ready_to_place(&self, cart: &Cart) -> Result<&PaymentDetails, CheckoutError> {
        if self.step != CheckoutStep::Review {
            return Err(CheckoutError::NotAtReview);
        }
        self.customer.validate()?;
        self.shipping.validate()?;
        let payment = self
            .payment
            .as_ref()
            .ok_or(CheckoutError::MissingField("payment method"))?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if cart.total() > MAX_ORDER_TOTAL {
            return Err(CheckoutError::TotalTooLarge);
        }
        Ok(payment)
    }
}
