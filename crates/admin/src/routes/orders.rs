//! Order management pages and the order JSON API.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use delightful_naturals_core::order::Order;
use delightful_naturals_core::{OrderId, OrderStatus};

use super::dashboard::AdminUserView;
use crate::db::OrderRepository;
use crate::db::orders::OrderFilter;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireAdminWrite};
use crate::state::AppState;

/// Orders shown on one list page.
const ORDER_LIST_LIMIT: i64 = 100;

/// List query parameters. `status` is `all` or one status.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub q: Option<String>,
    pub status: Option<String>,
}

/// Status change submitted by the detail page or the API.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// A status filter tab with its order count.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub value: &'static str,
    pub label: &'static str,
    pub count: i64,
    pub active: bool,
}

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub orders: Vec<Order>,
    pub tabs: Vec<StatusTab>,
    pub search_query: String,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub order: Order,
    pub statuses: Vec<OrderStatus>,
}

/// `None` for a missing or `all` filter.
fn parse_status_filter(raw: Option<&str>) -> Result<Option<OrderStatus>> {
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(AppError::BadRequest),
    }
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.trim().parse().map_err(AppError::BadRequest)
}

impl OrderListQuery {
    fn filter(&self) -> Result<OrderFilter> {
        Ok(OrderFilter {
            query: self.q.clone(),
            status: parse_status_filter(self.status.as_deref())?,
        })
    }
}

/// Build the filter tabs: `all` first, then every status in workflow order.
fn status_tabs(counts: &[(OrderStatus, i64)], active: Option<OrderStatus>) -> Vec<StatusTab> {
    let count_of = |status: OrderStatus| {
        counts
            .iter()
            .find(|(s, _)| *s == status)
            .map_or(0, |(_, n)| *n)
    };

    let mut tabs = vec![StatusTab {
        value: "all",
        label: "All",
        count: counts.iter().map(|(_, n)| n).sum(),
        active: active.is_none(),
    }];
    tabs.extend(OrderStatus::ALL.into_iter().map(|status| StatusTab {
        value: status.as_str(),
        label: status.label(),
        count: count_of(status),
        active: active == Some(status),
    }));
    tabs
}

/// Orders list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter()?;
    let repo = OrderRepository::new(state.pool());

    let orders = repo.list(&filter, ORDER_LIST_LIMIT).await?;
    let counts = repo.status_counts().await?;

    Ok(OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        orders,
        tabs: status_tabs(&counts, filter.status),
        search_query: query.q.unwrap_or_default(),
    })
}

/// Order detail page handler.
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        order,
        statuses: OrderStatus::ALL.to_vec(),
    })
}

/// `POST /orders/{id}/status` from the detail page form.
#[instrument(skip(admin, state))]
pub async fn update_status(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusUpdate>,
) -> Result<Redirect> {
    let status = parse_status(&form.status)?;
    let order = OrderRepository::new(state.pool())
        .set_status(id, status)
        .await?;
    tracing::info!(admin_id = %admin.id, order = %order.number, %status, "Order status changed");
    Ok(Redirect::to(&format!("/orders/{id}")))
}

/// `GET /api/orders?q=&status=` - matching orders plus per-status counts.
#[instrument(skip(_admin, state))]
pub async fn api_list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Value>> {
    let filter = query.filter()?;
    let repo = OrderRepository::new(state.pool());

    let orders = repo.list(&filter, ORDER_LIST_LIMIT).await?;
    let counts: serde_json::Map<String, Value> = repo
        .status_counts()
        .await?
        .into_iter()
        .map(|(status, n)| (status.as_str().to_string(), Value::from(n)))
        .collect();

    Ok(Json(json!({ "ok": true, "items": orders, "counts": counts })))
}

/// `PATCH /api/orders/{id}` with `{"status": "..."}`.
#[instrument(skip(admin, state))]
pub async fn api_update(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Value>> {
    let status = parse_status(&body.status)?;
    let order = OrderRepository::new(state.pool())
        .set_status(id, status)
        .await?;
    tracing::info!(admin_id = %admin.id, order = %order.number, %status, "Order status changed");
    Ok(Json(json!({ "ok": true, "order": order })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_status_filter(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_status_filter(Some("shipped")).unwrap(),
            Some(OrderStatus::Shipped)
        );
        assert!(parse_status_filter(Some("lost")).is_err());
    }

    #[test]
    fn test_any_status_can_be_set() {
        assert_eq!(parse_status("cancelled").unwrap(), OrderStatus::Cancelled);
        assert_eq!(parse_status(" pending ").unwrap(), OrderStatus::Pending);
        assert!(parse_status("Pending").is_err());
    }

    #[test]
    fn test_status_tabs_counts() {
        let counts = [(OrderStatus::Pending, 3), (OrderStatus::Delivered, 2)];
        let tabs = status_tabs(&counts, Some(OrderStatus::Pending));

        assert_eq!(tabs.len(), OrderStatus::ALL.len() + 1);
        let all = tabs.first().unwrap();
        assert_eq!(all.value, "all");
        assert_eq!(all.count, 5);
        assert!(!all.active);

        let pending = tabs.iter().find(|t| t.value == "pending").unwrap();
        assert_eq!(pending.count, 3);
        assert!(pending.active);

        let shipped = tabs.iter().find(|t| t.value == "shipped").unwrap();
        assert_eq!(shipped.count, 0);
    }
}
