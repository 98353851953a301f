//! Product identifiers and the numeric clamps applied to product content.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductIdError {
    #[error("product id cannot be empty")]
    Empty,
    #[error("product id must be at most {max} characters")]
    TooLong { max: usize },
    #[error("product id may only contain lowercase letters, digits and dashes")]
    InvalidCharacter,
    #[error("product id cannot start or end with a dash")]
    EdgeDash,
}

/// A product's slug, e.g. `detox-60` or `growth-100`.
///
/// Products are addressed by slug everywhere: storefront URLs, cart lines,
/// image paths and the admin editor. Only `[a-z0-9-]` is accepted so the id
/// can be embedded in a URL path without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Maximum slug length.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a product slug.
    ///
    /// # Errors
    ///
    /// Returns a [`ProductIdError`] if the input is empty, too long, contains
    /// characters outside `[a-z0-9-]`, or starts/ends with a dash.
    pub fn parse(s: &str) -> Result<Self, ProductIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProductIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ProductIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ProductIdError::InvalidCharacter);
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(ProductIdError::EdgeDash);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path the product's gallery image at `index` is served from.
    #[must_use]
    pub fn image_path(&self, index: u8) -> String {
        format!("/api/products/{}/images/{index}", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = ProductIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = ProductIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ProductId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ProductId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ProductId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Clamp a product star rating into `0.0..=5.0`. Non-finite input becomes `0.0`.
#[must_use]
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(0.0, 5.0)
    } else {
        0.0
    }
}

/// Clamp a testimonial rating into `1.0..=5.0`. Non-finite input becomes `5.0`.
#[must_use]
pub fn clamp_testimonial_rating(rating: f64) -> f64 {
    if rating.is_finite() {
        rating.clamp(1.0, 5.0)
    } else {
        5.0
    }
}

/// Floor a review count at zero, dropping any fractional part.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // clamped into i32 range first
pub fn clamp_reviews(reviews: f64) -> i32 {
    if reviews.is_finite() {
        reviews.floor().clamp(0.0, f64::from(i32::MAX)) as i32
    } else {
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(ProductId::parse("detox-60").unwrap().as_str(), "detox-60");
        assert_eq!(ProductId::parse(" growth-100 ").unwrap().as_str(), "growth-100");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(ProductId::parse(""), Err(ProductIdError::Empty));
        assert_eq!(ProductId::parse("Detox"), Err(ProductIdError::InvalidCharacter));
        assert_eq!(ProductId::parse("a/b"), Err(ProductIdError::InvalidCharacter));
        assert_eq!(ProductId::parse("-detox"), Err(ProductIdError::EdgeDash));
        assert!(matches!(
            ProductId::parse(&"a".repeat(65)),
            Err(ProductIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_image_path() {
        let id = ProductId::parse("growth-100").unwrap();
        assert_eq!(id.image_path(2), "/api/products/growth-100/images/2");
    }

    #[test]
    fn test_clamp_rating() {
        assert!((clamp_rating(7.5) - 5.0).abs() < f64::EPSILON);
        assert!((clamp_rating(-1.0) - 0.0).abs() < f64::EPSILON);
        assert!((clamp_rating(4.8) - 4.8).abs() < f64::EPSILON);
        assert!((clamp_rating(f64::NAN) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_testimonial_rating() {
        assert!((clamp_testimonial_rating(0.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_testimonial_rating(9.0) - 5.0).abs() < f64::EPSILON);
        assert!((clamp_testimonial_rating(f64::INFINITY) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamp_reviews() {
        assert_eq!(clamp_reviews(12.9), 12);
        assert_eq!(clamp_reviews(-3.0), 0);
        assert_eq!(clamp_reviews(f64::NAN), 0);
    }
}
