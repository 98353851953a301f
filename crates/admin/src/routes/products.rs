//! Product editor pages and the product JSON API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use delightful_naturals_core::ProductId;
use delightful_naturals_core::catalog::{Product, ProductImage, parse_image_index};

use super::dashboard::AdminUserView;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::media::MAX_UPLOAD_BYTES;
use crate::middleware::{RequireAdminAuth, RequireAdminWrite};
use crate::services::products::parse_submission;
use crate::state::AppState;

/// Cache policy for stored product images.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Editor view of a product. List fields are one entry per line.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub id: String,
    pub name: String,
    pub size: String,
    pub in_stock: bool,
    pub price: String,
    pub blurb: String,
    pub how_to_use: String,
    pub benefits: String,
    pub gallery: Vec<String>,
    pub rating: String,
    pub reviews: i32,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            size: product.size.clone(),
            in_stock: product.in_stock,
            price: product.price.to_string(),
            blurb: product.blurb.clone(),
            how_to_use: product.how_to_use.join("\n"),
            benefits: product.benefits.join("\n"),
            gallery: product.gallery.clone(),
            rating: product.rating.to_string(),
            reviews: product.reviews,
        }
    }
}

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub products: Vec<Product>,
    /// Catalog ids with no saved product yet.
    pub missing_ids: Vec<String>,
}

/// Product editor template, shared by create and edit.
#[derive(Template, WebTemplate)]
#[template(path = "products/edit.html")]
pub struct ProductEditTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub product: ProductForm,
    pub is_new: bool,
    /// Ids selectable when creating.
    pub catalog_ids: Vec<String>,
}

/// Query for the new-product page.
#[derive(Debug, Deserialize)]
pub struct NewProductQuery {
    pub id: Option<String>,
}

/// Parse a path id and check it against the catalog allow-list.
fn catalog_id(state: &AppState, raw: &str) -> Result<ProductId> {
    ProductId::parse(raw)
        .ok()
        .filter(|id| state.config().is_catalog_product(id))
        .ok_or_else(|| AppError::BadRequest("Invalid product id".to_string()))
}

/// Products list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool()).list().await?;

    let missing_ids = state
        .config()
        .catalog_product_ids
        .iter()
        .filter(|id| !products.iter().any(|p| &p.id == *id))
        .map(ToString::to_string)
        .collect();

    Ok(ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        products,
        missing_ids,
    })
}

/// New product page. An already-saved id opens its editor instead.
#[instrument(skip(admin, state))]
pub async fn new_page(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Query(query): Query<NewProductQuery>,
) -> Result<impl IntoResponse> {
    let requested = query.id.as_deref().map(|raw| catalog_id(&state, raw)).transpose()?;

    let product = match &requested {
        Some(id) => ProductRepository::new(state.pool()).get(id).await?,
        None => None,
    };

    let (product, is_new) = match (product, requested) {
        (Some(existing), _) => (ProductForm::from(&existing), false),
        (None, Some(id)) => (
            ProductForm {
                id: id.to_string(),
                ..ProductForm::default()
            },
            true,
        ),
        (None, None) => (ProductForm::default(), true),
    };

    Ok(ProductEditTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        product,
        is_new,
        catalog_ids: state
            .config()
            .catalog_product_ids
            .iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// Product edit page handler.
#[instrument(skip(admin, state))]
pub async fn edit_page(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = catalog_id(&state, &id)?;
    let product = ProductRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductEditTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        product: ProductForm::from(&product),
        is_new: false,
        catalog_ids: vec![id.to_string()],
    })
}

/// `POST /api/products` - create or update a product with inline images.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn api_upsert(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Response> {
    let submission = parse_submission(&body, &state.config().catalog_product_ids)?;

    let (product, created) = ProductRepository::new(state.pool())
        .upsert(&submission.draft, &submission.images)
        .await?;

    tracing::info!(
        product_id = %product.id,
        created,
        images = submission.images.len(),
        "Product saved"
    );

    Ok(Json(json!({ "ok": true, "created": created, "product": product })).into_response())
}

/// `GET /api/products/{id}`
#[instrument(skip(_admin, state))]
pub async fn api_show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = catalog_id(&state, &id)?;
    let product = ProductRepository::new(state.pool())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}` - removes the images, then the product.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn api_delete(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = catalog_id(&state, &id)?;
    ProductRepository::new(state.pool()).delete(&id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "ok": true })))
}

/// `GET /api/products/{id}/images/{index}` - stored image bytes.
#[instrument(skip(_admin, state))]
pub async fn image(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> Result<Response> {
    let id = catalog_id(&state, &id)?;
    let index = parse_image_index(&index)
        .ok_or_else(|| AppError::BadRequest("Invalid image index".to_string()))?;

    let image = ProductRepository::new(state.pool())
        .get_image(&id, index)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    Ok(image_response(image))
}

fn image_response(image: ProductImage) -> Response {
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

/// `POST /api/upload` - multipart `file` + `productId`, stored in the media directory.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn upload(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut product_id = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::PayloadTooLarge("File too large".to_string()));
                }
                file = Some((name, data.to_vec()));
            }
            Some("productId") => {
                product_id = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
            }
            _ => {}
        }
    }

    let (name, data) = file.ok_or_else(|| AppError::BadRequest("No file".to_string()))?;
    let product_id = ProductId::parse(product_id.trim())
        .ok()
        .filter(|id| state.config().is_catalog_product(id))
        .ok_or_else(|| AppError::BadRequest("Invalid productId".to_string()))?;

    let stored = state
        .media()
        .save_product_file(&product_id, &name, &data)
        .await
        .map_err(|e| AppError::Internal(format!("upload failed: {e}")))?;

    Ok(Json(json!({ "ok": true, "url": stored.url, "path": stored.path })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_product_form_joins_lists() {
        let product = Product {
            id: ProductId::parse("growth-100").unwrap(),
            name: "Growth Oil".to_string(),
            size: "100ml".to_string(),
            in_stock: true,
            price: Decimal::new(24_900, 2),
            blurb: String::new(),
            how_to_use: vec!["Part hair".to_string(), "Apply to scalp".to_string()],
            benefits: vec![],
            gallery: vec![],
            rating: 4.5,
            reviews: 12,
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        };
        let form = ProductForm::from(&product);
        assert_eq!(form.id, "growth-100");
        assert_eq!(form.price, "249.00");
        assert_eq!(form.how_to_use, "Part hair\nApply to scalp");
        assert_eq!(form.benefits, "");
        assert_eq!(form.rating, "4.5");
    }

    #[test]
    fn test_image_response_defaults_mime() {
        let image = ProductImage {
            product_id: ProductId::parse("detox-60").unwrap(),
            idx: 1,
            name: "side.webp".to_string(),
            mime: String::new(),
            size: 2,
            data: vec![9, 9],
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        };
        let response = image_response(image);
        let headers = response.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/webp");
        assert_eq!(headers.get(header::CONTENT_LENGTH).unwrap(), "2");
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            IMAGE_CACHE_CONTROL
        );
    }
}
