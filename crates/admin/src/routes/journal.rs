//! Journal post management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use delightful_naturals_core::content::JournalPost;

use super::{clamp_limit, dashboard::AdminUserView};
use crate::db::JournalRepository;
use crate::db::journal::JournalQuery;
use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdminAuth, RequireAdminWrite};
use crate::services::content::parse_journal_post;
use crate::state::AppState;

/// Journal list parameters: page size, cursor and slug-prefix search.
#[derive(Debug, Default, Deserialize)]
pub struct JournalListQuery {
    pub limit: Option<String>,
    pub after: Option<String>,
    pub q: Option<String>,
}

impl JournalListQuery {
    fn to_query(&self) -> JournalQuery {
        JournalQuery {
            limit: clamp_limit(self.limit.as_deref()),
            after: self
                .after
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(ToString::to_string),
            slug_prefix: self
                .q
                .as_deref()
                .map(|q| q.trim().to_lowercase())
                .filter(|q| !q.is_empty()),
        }
    }
}

/// Journal page template.
#[derive(Template, WebTemplate)]
#[template(path = "journal/index.html")]
pub struct JournalTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub posts: Vec<JournalPost>,
    pub search_query: String,
    pub next_cursor: Option<String>,
}

/// The cursor for the page after `posts`: the last post's id.
fn next_cursor(posts: &[JournalPost]) -> Option<String> {
    posts.last().map(|p| p.id.clone())
}

/// Journal page handler.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<JournalListQuery>,
) -> Result<impl IntoResponse> {
    let list = query.to_query();
    let posts = JournalRepository::new(state.pool()).list(&list).await?;

    // A short page means there is nothing after it.
    let next_cursor = if i64::try_from(posts.len()).unwrap_or(i64::MAX) < list.limit {
        None
    } else {
        next_cursor(&posts)
    };

    Ok(JournalTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/journal".to_string(),
        posts,
        search_query: query.q.unwrap_or_default(),
        next_cursor,
    })
}

/// `GET /api/journal?limit=&after=&q=`
#[instrument(skip(_admin, state))]
pub async fn api_list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<JournalListQuery>,
) -> Result<Json<Value>> {
    let posts = JournalRepository::new(state.pool())
        .list(&query.to_query())
        .await?;
    let next_cursor = next_cursor(&posts);
    Ok(Json(json!({ "ok": true, "items": posts, "nextCursor": next_cursor })))
}

/// `POST /api/journal` - create a post (201).
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn api_create(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse> {
    let draft = parse_journal_post(&body)?;
    let post = JournalRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "Journal post saved");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "item": post })),
    ))
}

/// `DELETE /api/journal/{id}`
#[instrument(skip(admin, state))]
pub async fn api_delete(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    JournalRepository::new(state.pool()).delete(&id).await?;
    tracing::info!(admin_id = %admin.id, post_id = %id, "Journal post deleted");
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_normalization() {
        let query = JournalListQuery {
            limit: Some("500".to_string()),
            after: Some("  ".to_string()),
            q: Some(" Wash ".to_string()),
        };
        let list = query.to_query();
        assert_eq!(list.limit, 100);
        assert_eq!(list.after, None);
        assert_eq!(list.slug_prefix.as_deref(), Some("wash"));
    }

    #[test]
    fn test_defaults() {
        let list = JournalListQuery::default().to_query();
        assert_eq!(list.limit, crate::routes::DEFAULT_PAGE_LIMIT);
        assert_eq!(list.after, None);
        assert_eq!(list.slug_prefix, None);
    }
}
