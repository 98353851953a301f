//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use delightful_naturals_core::catalog::Product;
use delightful_naturals_core::format_zar;
use delightful_naturals_core::order::Order;

use crate::db::DashboardRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role: String,
    pub can_write: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role: admin.role.to_string(),
            can_write: admin.role.can_write(),
        }
    }
}

/// Dashboard metrics, already formatted.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub revenue: String,
    pub orders: i64,
    pub customers: i64,
    pub products: i64,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<Order>,
    pub low_stock: Vec<Product>,
}

/// Dashboard page handler.
#[instrument(skip(admin, state))]
pub async fn dashboard(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let repo = DashboardRepository::new(state.pool());

    let (totals, recent_orders, low_stock) =
        tokio::join!(repo.totals(), repo.recent_orders(), repo.out_of_stock());
    let totals = totals?;

    let metrics = DashboardMetrics {
        revenue: format_zar(totals.revenue),
        orders: totals.order_count,
        customers: totals.customer_count,
        products: totals.product_count,
    };

    Ok(DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/".to_string(),
        metrics,
        recent_orders: recent_orders?,
        low_stock: low_stock?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delightful_naturals_core::{AdminRole, AdminUserId, Email};

    use super::*;

    #[test]
    fn test_viewer_view_is_read_only() {
        let admin = CurrentAdmin {
            id: AdminUserId::new(3),
            email: Email::parse("thandi@delightfulnaturals.co.za").unwrap(),
            name: "Thandi".to_string(),
            role: AdminRole::Viewer,
        };
        let view = AdminUserView::from(&admin);
        assert!(!view.can_write);
        assert_eq!(view.role, "viewer");
        assert_eq!(view.email, "thandi@delightfulnaturals.co.za");
    }
}
