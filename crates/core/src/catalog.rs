//! Catalog records: products and their stored gallery images.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartProduct;
use crate::types::{ProductId, format_zar};

/// Highest gallery slot an uploaded image may occupy.
pub const MAX_IMAGE_INDEX: u8 = 20;

/// Largest decoded image payload accepted by the product editor (950 KiB).
pub const MAX_IMAGE_BYTES: usize = 950 * 1024;

/// Content type served when an image was stored without one.
pub const DEFAULT_IMAGE_MIME: &str = "image/webp";

/// Highest product price the catalog stores (`NUMERIC(12,2)`).
// 9_999_999_999.99 (999_999_999_999 at scale 2); `Decimal::new` is not const.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// A product as stored and served to both the storefront and the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub size: String,
    pub in_stock: bool,
    pub price: Decimal,
    pub blurb: String,
    pub how_to_use: Vec<String>,
    pub benefits: Vec<String>,
    pub gallery: Vec<String>,
    /// Average star rating, `0.0..=5.0`.
    pub rating: f64,
    pub reviews: i32,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// First gallery image, used for cards and cart thumbnails.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.gallery.first().map(String::as_str)
    }

    /// Formatted price, e.g. `R300.00`.
    #[must_use]
    pub fn display_price(&self) -> String {
        format_zar(self.price)
    }

    /// The subset of product data a cart line carries.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id.clone(),
            name: self.name.clone(),
            size: self.size.clone(),
            price: self.price,
            image: self.primary_image().map(ToOwned::to_owned),
            in_stock: self.in_stock,
        }
    }
}

/// A gallery image stored in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub product_id: ProductId,
    pub idx: i16,
    pub name: String,
    pub mime: String,
    pub size: i32,
    pub data: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

impl ProductImage {
    /// Stored content type, falling back to [`DEFAULT_IMAGE_MIME`].
    #[must_use]
    pub fn content_type(&self) -> &str {
        if self.mime.trim().is_empty() {
            DEFAULT_IMAGE_MIME
        } else {
            &self.mime
        }
    }
}

/// Parse a gallery slot from a path segment. Accepts `0..=MAX_IMAGE_INDEX`.
#[must_use]
pub fn parse_image_index(raw: &str) -> Option<u8> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|idx| *idx <= MAX_IMAGE_INDEX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::parse("growth-100").unwrap(),
            name: "Growth Oil".to_string(),
            size: "100ml".to_string(),
            in_stock: true,
            price: Decimal::from(260),
            blurb: String::new(),
            how_to_use: vec![],
            benefits: vec![],
            gallery: vec!["/api/products/growth-100/images/0".to_string()],
            rating: 4.8,
            reviews: 12,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_image_index_bounds() {
        assert_eq!(parse_image_index("0"), Some(0));
        assert_eq!(parse_image_index("20"), Some(20));
        assert_eq!(parse_image_index("21"), None);
        assert_eq!(parse_image_index("-1"), None);
        assert_eq!(parse_image_index("abc"), None);
    }

    #[test]
    fn test_to_cart_product_uses_first_gallery_image() {
        let cart_product = product().to_cart_product();
        assert_eq!(
            cart_product.image.as_deref(),
            Some("/api/products/growth-100/images/0")
        );
        assert_eq!(cart_product.price, Decimal::from(260));
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(product()).unwrap();
        assert_eq!(json["inStock"], serde_json::Value::Bool(true));
        assert!(json.get("howToUse").is_some());
    }

    #[test]
    fn test_image_content_type_default() {
        let image = ProductImage {
            product_id: ProductId::parse("detox-60").unwrap(),
            idx: 0,
            name: "front.webp".to_string(),
            mime: String::new(),
            size: 3,
            data: vec![1, 2, 3],
            updated_at: Utc::now(),
        };
        assert_eq!(image.content_type(), DEFAULT_IMAGE_MIME);
    }
}
