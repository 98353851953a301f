//! Testimonial management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::instrument;

use delightful_naturals_core::content::Testimonial;

use super::{LimitQuery, dashboard::AdminUserView};
use crate::db::TestimonialRepository;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireAdminWrite};
use crate::services::content::parse_testimonial;
use crate::state::AppState;

/// Testimonials page template.
#[derive(Template, WebTemplate)]
#[template(path = "testimonials/index.html")]
pub struct TestimonialsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub testimonials: Vec<Testimonial>,
}

/// Testimonials page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let testimonials = TestimonialRepository::new(state.pool())
        .list(super::DEFAULT_PAGE_LIMIT)
        .await?;

    Ok(TestimonialsTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/testimonials".to_string(),
        testimonials,
    })
}

/// `GET /api/testimonials?limit=` - every testimonial, latest updated first.
#[instrument(skip(_admin, state))]
pub async fn api_list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<Testimonial>>> {
    let testimonials = TestimonialRepository::new(state.pool())
        .list(query.limit())
        .await?;
    Ok(Json(testimonials))
}

/// `POST /api/testimonials` - create, or update when `id` is known.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn api_upsert(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let draft = parse_testimonial(&body);
    let testimonial = TestimonialRepository::new(state.pool())
        .upsert(&draft)
        .await?;
    tracing::info!(testimonial_id = %testimonial.id, "Testimonial saved");
    Ok(Json(json!({ "ok": true, "testimonial": testimonial })))
}
