//! Order confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use delightful_naturals_core::order::{Order, OrderNumber};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::state::AppState;

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: Order,
}

/// Show a placed order.
///
/// Visible to the session that placed it and to the account it belongs to;
/// everyone else gets a 404.
#[instrument(skip(state, session, customer))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(number): Path<String>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("order {number}"));
    let parsed = OrderNumber::parse(&number).map_err(|_| not_found())?;

    let order = OrderRepository::new(state.pool())
        .get_by_number(&parsed)
        .await?
        .ok_or_else(not_found)?;

    let placed_here = session
        .get::<String>(session_keys::LAST_ORDER)
        .await
        .ok()
        .flatten()
        .is_some_and(|last| last == order.number.as_str());
    let owned = customer.is_some_and(|c| order.customer_id == Some(c.id));

    if !(placed_here || owned) {
        return Err(not_found());
    }

    Ok(ConfirmationTemplate { order })
}
