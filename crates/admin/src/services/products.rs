//! Product editor submissions.
//!
//! Turns the editor's JSON body into a [`ProductDraft`] plus decoded gallery
//! images. Every field is coerced rather than rejected; only the product id,
//! image slots and image payloads can fail.

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;
use thiserror::Error;

use delightful_naturals_core::catalog::{
    DEFAULT_IMAGE_MIME, MAX_IMAGE_BYTES, MAX_IMAGE_INDEX, MAX_PRICE,
};
use delightful_naturals_core::{ProductId, clamp_rating, clamp_reviews};

use super::coerce;
use crate::db::products::{NewImage, ProductDraft};

/// Why a product submission was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Invalid product id")]
    InvalidProductId,

    #[error("Price {0} exceeds the maximum of {MAX_PRICE}")]
    PriceOutOfRange(Decimal),

    #[error("Image slot {0} is out of range (0-{MAX_IMAGE_INDEX})")]
    InvalidImageIndex(u64),

    #[error("Image {0} is not valid base64")]
    InvalidImageData(String),

    #[error("Image {0} is too large after compression (> 950KB)")]
    ImageTooLarge(String),
}

/// A validated editor submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSubmission {
    pub draft: ProductDraft,
    pub images: Vec<NewImage>,
}

/// Parse an editor body. `allowed` is the catalog allow-list.
///
/// # Errors
///
/// Returns [`SubmissionError::InvalidProductId`] for ids outside `allowed`,
/// [`SubmissionError::PriceOutOfRange`] above [`MAX_PRICE`], and an image error for a bad slot, undecodable data or an oversized image.
pub fn parse_submission(
    body: &Value,
    allowed: &[ProductId],
) -> Result<ProductSubmission, SubmissionError> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .and_then(|raw| ProductId::parse(raw).ok())
        .filter(|id| allowed.contains(id))
        .ok_or(SubmissionError::InvalidProductId)?;

    let price = parse_price(body)?;
    let images = parse_images(body)?;

    let mut gallery: Vec<Option<String>> = coerce::string_list(body, "gallery")
        .into_iter()
        .map(Some)
        .collect();
    for image in &images {
        let slot = usize::from(image.index);
        if gallery.len() <= slot {
            gallery.resize(slot + 1, None);
        }
        if let Some(entry) = gallery.get_mut(slot) {
            *entry = Some(id.image_path(image.index));
        }
    }

    let draft = ProductDraft {
        name: coerce::text(body, "name"),
        size: coerce::text(body, "size"),
        in_stock: coerce::truthy(body, "inStock"),
        price,
        blurb: coerce::text(body, "blurb"),
        how_to_use: coerce::string_list(body, "howToUse"),
        benefits: coerce::string_list(body, "benefits"),
        gallery: gallery.into_iter().flatten().collect(),
        rating: clamp_rating(coerce::number(body, "rating")),
        reviews: clamp_reviews(coerce::number(body, "reviews")),
        id,
    };

    Ok(ProductSubmission { draft, images })
}

/// Price in Rand, two decimal places. Negative or unparseable prices become
/// zero; anything above [`MAX_PRICE`] is refused.
fn parse_price(body: &Value) -> Result<Decimal, SubmissionError> {
    let price = coerce::text(body, "price")
        .trim()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(coerce::number(body, "price")))
        .filter(|price| !price.is_sign_negative())
        .map_or(Decimal::ZERO, |price| price.round_dp(2));
    if price > MAX_PRICE {
        return Err(SubmissionError::PriceOutOfRange(price));
    }
    Ok(price)
}

/// Decode the optional `images` array. Entries missing an integer `index`,
/// a string `base64` or a string `type` are skipped.
fn parse_images(body: &Value) -> Result<Vec<NewImage>, SubmissionError> {
    let Some(Value::Array(entries)) = body.get("images") else {
        return Ok(Vec::new());
    };

    let mut images = Vec::with_capacity(entries.len());
    for entry in entries {
        let (Some(index), Some(payload), Some(mime)) = (
            entry.get("index").and_then(Value::as_u64),
            entry.get("base64").and_then(Value::as_str),
            entry.get("type").and_then(Value::as_str),
        ) else {
            continue;
        };

        let index = u8::try_from(index)
            .ok()
            .filter(|i| *i <= MAX_IMAGE_INDEX)
            .ok_or(SubmissionError::InvalidImageIndex(index))?;

        let name = coerce::text(entry, "name");
        let label = if name.is_empty() {
            index.to_string()
        } else {
            name.clone()
        };

        let data = decode_image(payload).ok_or_else(|| SubmissionError::InvalidImageData(label.clone()))?;
        if data.len() > MAX_IMAGE_BYTES {
            return Err(SubmissionError::ImageTooLarge(label));
        }

        images.push(NewImage {
            index,
            name: if name.is_empty() {
                format!("image-{index}")
            } else {
                name
            },
            mime: if mime.is_empty() {
                DEFAULT_IMAGE_MIME.to_string()
            } else {
                mime.to_string()
            },
            data,
        });
    }
    Ok(images)
}

/// Strip a `data:<mime>;base64,` prefix and decode. Whitespace and padding
/// are tolerated.
fn decode_image(payload: &str) -> Option<Vec<u8>> {
    let encoded = match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, data)| data),
        None => payload,
    };
    let cleaned: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD_NO_PAD.decode(cleaned.trim_end_matches('=')).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    use super::*;

    fn allowed() -> Vec<ProductId> {
        vec![
            ProductId::parse("detox-60").unwrap(),
            ProductId::parse("growth-100").unwrap(),
        ]
    }

    #[test]
    fn test_rejects_ids_outside_allow_list() {
        let body = json!({ "id": "shampoo-250", "name": "Shampoo" });
        assert_eq!(
            parse_submission(&body, &allowed()),
            Err(SubmissionError::InvalidProductId)
        );
        assert_eq!(
            parse_submission(&json!({}), &allowed()),
            Err(SubmissionError::InvalidProductId)
        );
    }

    #[test]
    fn test_coerces_fields() {
        let body = json!({
            "id": "detox-60",
            "name": "Detox Scalp Scrub",
            "size": 60,
            "inStock": "yes",
            "price": "189.999",
            "howToUse": ["Wet hair", "", "Massage in"],
            "benefits": "not a list",
            "rating": 7.5,
            "reviews": -3.7,
        });
        let draft = parse_submission(&body, &allowed()).unwrap().draft;

        assert_eq!(draft.size, "60");
        assert!(draft.in_stock);
        assert_eq!(draft.price, Decimal::new(19000, 2));
        assert_eq!(draft.how_to_use, vec!["Wet hair", "Massage in"]);
        assert!(draft.benefits.is_empty());
        assert!((draft.rating - 5.0).abs() < f64::EPSILON);
        assert_eq!(draft.reviews, 0);
        assert_eq!(draft.blurb, "");
    }

    #[test]
    fn test_negative_and_garbage_prices_become_zero() {
        let body = json!({ "id": "detox-60", "price": -10 });
        assert_eq!(parse_submission(&body, &allowed()).unwrap().draft.price, Decimal::ZERO);

        let body = json!({ "id": "detox-60", "price": "free" });
        assert_eq!(parse_submission(&body, &allowed()).unwrap().draft.price, Decimal::ZERO);
    }

    #[test]
    fn test_price_above_column_bound_is_refused() {
        for price in [json!("1e11"), json!(100_000_000_000_u64), json!("10000000000")] {
            let body = json!({ "id": "detox-60", "price": price });
            assert!(matches!(
                parse_submission(&body, &allowed()),
                Err(SubmissionError::PriceOutOfRange(_))
            ));
        }

        let body = json!({ "id": "detox-60", "price": "9999999999.99" });
        assert_eq!(parse_submission(&body, &allowed()).unwrap().draft.price, MAX_PRICE);
    }

    #[test]
    fn test_images_fill_gallery_slots() {
        let payload = format!("data:image/webp;base64,{}", STANDARD.encode(b"webp-bytes"));
        let body = json!({
            "id": "growth-100",
            "gallery": ["https://cdn.example/a.jpg", ""],
            "images": [
                { "index": 2, "name": "", "type": "", "base64": payload },
                { "index": "0", "type": "image/png", "base64": "AAAA" },
            ],
        });
        let submission = parse_submission(&body, &allowed()).unwrap();

        assert_eq!(submission.images.len(), 1);
        let image = submission.images.first().unwrap();
        assert_eq!(image.index, 2);
        assert_eq!(image.name, "image-2");
        assert_eq!(image.mime, DEFAULT_IMAGE_MIME);
        assert_eq!(image.data, b"webp-bytes");

        assert_eq!(
            submission.draft.gallery,
            vec![
                "https://cdn.example/a.jpg".to_string(),
                "/api/products/growth-100/images/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let big = STANDARD.encode(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let body = json!({
            "id": "detox-60",
            "images": [{ "index": 0, "name": "hero.webp", "type": "image/webp", "base64": big }],
        });
        let err = parse_submission(&body, &allowed()).unwrap_err();
        assert_eq!(err, SubmissionError::ImageTooLarge("hero.webp".to_string()));
        assert_eq!(
            err.to_string(),
            "Image hero.webp is too large after compression (> 950KB)"
        );
    }

    #[test]
    fn test_image_at_cap_is_accepted() {
        let exact = STANDARD.encode(vec![7u8; MAX_IMAGE_BYTES]);
        let body = json!({
            "id": "detox-60",
            "images": [{ "index": 0, "type": "image/webp", "base64": exact }],
        });
        assert!(parse_submission(&body, &allowed()).is_ok());
    }

    #[test]
    fn test_image_slot_out_of_range() {
        let body = json!({
            "id": "detox-60",
            "images": [{ "index": 21, "type": "image/webp", "base64": "AAAA" }],
        });
        assert_eq!(
            parse_submission(&body, &allowed()),
            Err(SubmissionError::InvalidImageIndex(21))
        );
    }

    #[test]
    fn test_decode_image_tolerates_padding_and_whitespace() {
        assert_eq!(decode_image("aGk=").unwrap(), b"hi");
        assert_eq!(decode_image("aG\nk=").unwrap(), b"hi");
        assert_eq!(decode_image("data:text/plain;base64,aGk").unwrap(), b"hi");
        assert!(decode_image("!!!").is_none());
    }
}
