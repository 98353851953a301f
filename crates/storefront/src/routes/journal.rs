//! Journal pages and the public testimonials feed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use delightful_naturals_core::content::{JournalPost, Testimonial};
use delightful_naturals_core::slug::normalize_slug;

use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::markdown::{reading_time_minutes, render_markdown};
use crate::state::AppState;

/// Posts listed on `/journal`.
const JOURNAL_PAGE_SIZE: i64 = 50;

/// Testimonials returned by `/api/testimonials`.
const TESTIMONIALS_LIMIT: i64 = 50;

/// Journal index template.
#[derive(Template, WebTemplate)]
#[template(path = "journal/index.html")]
pub struct JournalIndexTemplate {
    pub posts: Vec<JournalPost>,
}

/// Journal post template. `content_html` is rendered markdown.
#[derive(Template, WebTemplate)]
#[template(path = "journal/show.html")]
pub struct JournalShowTemplate {
    pub post: JournalPost,
    pub content_html: String,
    pub reading_time: usize,
}

/// List published posts.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let posts = ContentRepository::new(state.pool())
        .published_posts(JOURNAL_PAGE_SIZE)
        .await?;
    Ok(JournalIndexTemplate { posts })
}

/// Show a published post by slug.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let slug = normalize_slug(&slug);
    let post = ContentRepository::new(state.pool())
        .published_post_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("journal post {slug}")))?;

    let content_html = render_markdown(&post.content);
    let reading_time = reading_time_minutes(&post.content);

    Ok(JournalShowTemplate {
        post,
        content_html,
        reading_time,
    })
}

/// `GET /api/testimonials` - published testimonials, latest first.
#[instrument(skip(state))]
pub async fn api_testimonials(State(state): State<AppState>) -> Result<Json<Vec<Testimonial>>> {
    let testimonials = ContentRepository::new(state.pool())
        .published_testimonials(TESTIMONIALS_LIMIT)
        .await?;
    Ok(Json(testimonials))
}
