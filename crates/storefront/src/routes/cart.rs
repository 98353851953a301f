//! Cart route handlers.
//!
//! The session holds only `(product_id, quantity)` pairs. Every request
//! rebuilds the cart from current catalog data, dropping lines whose
//! product no longer exists, and runs changes through the core reducer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use delightful_naturals_core::ProductId;
use delightful_naturals_core::cart::{Cart, CartAction, CartLine, StoredCartLine};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Rebuild the session cart from current catalog data.
///
/// # Errors
///
/// Returns `AppError::Database` if a catalog read fails.
pub async fn load_cart(state: &AppState, session: &Session) -> Result<Cart> {
    let stored: Vec<StoredCartLine> = session
        .get(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    let mut lines = Vec::with_capacity(stored.len());
    for entry in stored {
        match state.catalog().product(state.pool(), &entry.product_id).await? {
            Some(product) => lines.push(CartLine {
                product: product.to_cart_product(),
                quantity: entry.quantity,
            }),
            None => {
                tracing::info!(product_id = %entry.product_id, "Dropping cart line for removed product");
            }
        }
    }

    Ok(Cart::from_lines(lines))
}

/// Persist the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    if cart.is_empty() {
        session.remove::<Vec<StoredCartLine>>(session_keys::CART).await?;
    } else {
        session.insert(session_keys::CART, cart.to_stored()).await?;
    }
    Ok(())
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data. Zero or less removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: Cart,
}

/// Cart count badge fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(format!("Invalid product id: {e}")))
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let cart = load_cart(&state, &session).await?;
    Ok(CartShowTemplate { cart })
}

/// Add a product to the cart.
///
/// Unknown and out-of-stock products are rejected.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;
    let product = state
        .catalog()
        .product(state.pool(), &product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "{} is out of stock",
            product.name
        )));
    }

    let mut cart = load_cart(&state, &session).await?;
    cart.apply(CartAction::Add {
        product: product.to_cart_product(),
        quantity: form.quantity.unwrap_or(1),
    });
    save_cart(&session, &cart).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Redirect::to("/cart").into_response())
}

/// Set a line's quantity.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;
    let mut cart = load_cart(&state, &session).await?;
    cart.apply(CartAction::UpdateQuantity {
        product_id,
        quantity: form.quantity,
    });
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let product_id = parse_product_id(&form.product_id)?;
    let mut cart = load_cart(&state, &session).await?;
    cart.apply(CartAction::Remove { product_id });
    save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Response> {
    save_cart(&session, &Cart::new()).await?;
    Ok(Redirect::to("/cart").into_response())
}

/// Cart count badge fragment.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let count = load_cart(&state, &session).await?.item_count();
    Ok(CartCountTemplate { count })
}

/// `GET /api/cart` - lines, subtotal and item count as JSON.
#[instrument(skip(state, session))]
pub async fn api(State(state): State<AppState>, session: Session) -> Result<Json<Cart>> {
    Ok(Json(load_cart(&state, &session).await?))
}
