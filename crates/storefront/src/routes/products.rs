//! Product pages, the product JSON API and stored gallery images.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use delightful_naturals_core::ProductId;
use delightful_naturals_core::catalog::{Product, ProductImage, parse_image_index};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::routes::cart::load_cart;
use crate::state::AppState;

/// Cache policy for stored gallery images. Image URLs change when the
/// editor writes a new slot, so they can be cached forever.
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Arc<Vec<Product>>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub in_cart: u32,
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid product id: {e}")))
}

/// Display product listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = state.catalog().products(state.pool()).await?;
    Ok(ProductsIndexTemplate { products })
}

/// Display a product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = ProductId::parse(&id).map_err(|_| AppError::NotFound(format!("product {id}")))?;
    let product = state
        .catalog()
        .product(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let in_cart = load_cart(&state, &session).await?.quantity_of(&product.id);

    Ok(ProductShowTemplate { product, in_cart })
}

/// `GET /api/products` - every product as a JSON array.
#[instrument(skip(state))]
pub async fn api_list(State(state): State<AppState>) -> Result<Response> {
    let products = state.catalog().products(state.pool()).await?;
    Ok(Json(products.as_slice()).into_response())
}

/// `GET /api/products/{id}` - one product, or 404.
#[instrument(skip(state))]
pub async fn api_show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = parse_product_id(&id)?;
    let product = state
        .catalog()
        .product(state.pool(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product).into_response())
}

/// `GET /api/products/{id}/images/{index}` - stored image bytes.
#[instrument(skip(state))]
pub async fn image(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> Result<Response> {
    let id = parse_product_id(&id)?;
    let index = parse_image_index(&index)
        .ok_or_else(|| AppError::BadRequest("Invalid image index".to_string()))?;

    let image = ProductRepository::new(state.pool())
        .get_image(&id, index)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("image {index} of {id}")))?;

    Ok(image_response(image))
}

/// Raw image bytes with content headers and a long-lived cache policy.
#[must_use]
pub fn image_response(image: ProductImage) -> Response {
    let content_type = HeaderValue::from_str(image.content_type())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let last_modified = image
        .updated_at
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    let length = image.data.len();

    let mut response = (StatusCode::OK, Body::from(image.data)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Ok(value) = HeaderValue::from_str(&last_modified) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(IMAGE_CACHE_CONTROL),
    );
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_image_response_headers() {
        let image = ProductImage {
            product_id: ProductId::parse("detox-60").unwrap(),
            idx: 0,
            name: "front.webp".to_string(),
            mime: String::new(),
            size: 3,
            data: vec![1, 2, 3],
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        };
        let response = image_response(image);
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/webp");
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "3");
        assert_eq!(
            headers.get(header::LAST_MODIFIED).unwrap(),
            "Sat, 01 Mar 2025 12:00:00 GMT"
        );
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            IMAGE_CACHE_CONTROL
        );
    }
}
