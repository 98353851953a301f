//! Customer list and detail pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use delightful_naturals_core::CustomerId;
use delightful_naturals_core::customer::{Address, Customer};
use delightful_naturals_core::order::Order;

use super::dashboard::AdminUserView;
use crate::db::customers::CustomerSummary;
use crate::db::{CustomerRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Customers shown on one list page.
const CUSTOMER_LIST_LIMIT: i64 = 100;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    pub q: Option<String>,
}

/// Customers list page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub customers: Vec<CustomerSummary>,
    pub search_query: String,
}

/// Customer detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub customer: Customer,
    pub addresses: Vec<Address>,
    pub orders: Vec<Order>,
    pub lifetime_spend: Decimal,
}

/// Sum of totals over orders that count towards revenue.
fn lifetime_spend(orders: &[Order]) -> Decimal {
    orders
        .iter()
        .filter(|o| o.status.is_revenue())
        .map(|o| o.total)
        .sum()
}

/// Customers list page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> Result<impl IntoResponse> {
    let customers = CustomerRepository::new(state.pool())
        .list(query.q.as_deref(), CUSTOMER_LIST_LIMIT)
        .await?;

    Ok(CustomersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/customers".to_string(),
        customers,
        search_query: query.q.unwrap_or_default(),
    })
}

/// Customer detail page handler.
#[instrument(skip(admin, state))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<impl IntoResponse> {
    let customers = CustomerRepository::new(state.pool());
    let customer = customers
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;

    let order_repo = OrderRepository::new(state.pool());
    let (addresses, orders) = tokio::join!(
        customers.addresses(id),
        order_repo.list_for_customer(id)
    );
    let orders = orders?;

    Ok(CustomerShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/customers".to_string(),
        lifetime_spend: lifetime_spend(&orders),
        customer,
        addresses: addresses?,
        orders,
    })
}
