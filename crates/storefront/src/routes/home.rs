//! Home page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use delightful_naturals_core::catalog::Product;
use delightful_naturals_core::content::{JournalPost, Testimonial};

use crate::db::ContentRepository;
use crate::filters;
use crate::state::AppState;

/// Testimonials shown on the home page.
const HOME_TESTIMONIALS: i64 = 6;

/// Journal teasers shown on the home page.
const HOME_POSTS: i64 = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Arc<Vec<Product>>,
    pub testimonials: Vec<Testimonial>,
    pub posts: Vec<JournalPost>,
}

/// Display the home page.
///
/// Each section degrades to empty if its query fails, so one broken table
/// never takes the landing page down.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let products = state
        .catalog()
        .products(state.pool())
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load products for home page: {e}");
            Arc::default()
        });

    let content = ContentRepository::new(state.pool());
    let testimonials = content
        .published_testimonials(HOME_TESTIMONIALS)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load testimonials for home page: {e}");
            Vec::new()
        });
    let posts = content
        .published_posts(HOME_POSTS)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load journal posts for home page: {e}");
            Vec::new()
        });

    HomeTemplate {
        products,
        testimonials,
        posts,
    }
}
