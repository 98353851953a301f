//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth (password login, accounts created with dn-cli)
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! POST /auth/logout            - Logout
//!
//! # Pages
//! GET  /                       - Dashboard
//! GET  /products               - Product list
//! GET  /products/new           - New product editor (write roles)
//! GET  /products/{id}/edit     - Product editor
//! GET  /orders                 - Order list (search + status filter)
//! GET  /orders/{id}            - Order detail
//! POST /orders/{id}/status     - Set order status
//! GET  /customers              - Customer list
//! GET  /customers/{id}         - Customer detail
//! GET  /testimonials           - Testimonials
//! GET  /journal                - Journal posts
//!
//! # JSON API
//! POST   /api/products                  - Upsert product with inline images
//! GET    /api/products/{id}             - Product document
//! DELETE /api/products/{id}             - Delete product and images
//! GET    /api/products/{id}/images/{n}  - Stored image bytes
//! POST   /api/upload                    - Multipart file upload to media
//! GET    /api/orders                    - Orders + status counts
//! PATCH  /api/orders/{id}               - Set order status
//! GET    /api/testimonials              - All testimonials
//! POST   /api/testimonials              - Upsert testimonial
//! GET    /api/journal                   - Paginated journal posts
//! POST   /api/journal                   - Create journal post
//! DELETE /api/journal/{id}              - Delete journal post
//! GET    /api/proxy?path=...            - Legacy REST API (read)
//! POST   /api/proxy?path=...            - Legacy REST API (write)
//!
//! # Files
//! GET  /media/...              - Uploaded files
//! GET  /static/...             - Stylesheets and scripts
//! ```

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod journal;
pub mod orders;
pub mod products;
pub mod proxy;
pub mod testimonials;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::media::{MAX_UPLOAD_BYTES, MEDIA_URL_PREFIX};
use crate::middleware::{
    create_session_layer, login_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = "crates/admin/static";

/// Body limit for editor JSON, which carries up to 21 base64 images.
const EDITOR_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// Page size when no `limit` is given.
pub(crate) const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Largest accepted `limit`.
const MAX_PAGE_LIMIT: i64 = 100;

/// Parse a `limit` query value into `1..=100`. Missing or non-numeric
/// values give the default; fractions are floored.
pub(crate) fn clamp_limit(raw: Option<&str>) -> i64 {
    raw.map(str::trim)
        .and_then(|r| r.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .map_or(DEFAULT_PAGE_LIMIT, |n| {
            #[allow(clippy::cast_possible_truncation)]
            let n = n.floor() as i64;
            n.clamp(1, MAX_PAGE_LIMIT)
        })
}

/// `?limit=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<String>,
}

impl LimitQuery {
    /// The clamped limit.
    #[must_use]
    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit.as_deref())
    }
}

/// Create the auth routes router.
///
/// The login POST sits behind the per-IP rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .merge(limited)
        .route("/logout", post(auth::logout))
}

/// Create the page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/products", get(products::index))
        .route("/products/new", get(products::new_page))
        .route("/products/{id}/edit", get(products::edit_page))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", post(orders::update_status))
        .route("/customers", get(customers::index))
        .route("/customers/{id}", get(customers::show))
        .route("/testimonials", get(testimonials::index))
        .route("/journal", get(journal::index))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            post(products::api_upsert).layer(DefaultBodyLimit::max(EDITOR_BODY_LIMIT)),
        )
        .route(
            "/products/{id}",
            get(products::api_show).delete(products::api_delete),
        )
        .route("/products/{id}/images/{index}", get(products::image))
        .route(
            "/upload",
            // Multipart framing on top of the largest file.
            post(products::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/orders", get(orders::api_list))
        .route("/orders/{id}", patch(orders::api_update))
        .route(
            "/testimonials",
            get(testimonials::api_list).post(testimonials::api_upsert),
        )
        .route(
            "/journal",
            get(journal::api_list).post(journal::api_create),
        )
        .route("/journal/{id}", delete(journal::api_delete))
        .route("/proxy", get(proxy::get).post(proxy::post))
}

/// Create all routes for the admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/api", api_routes())
        .merge(page_routes())
}

/// Build the full application with middleware, over any session store.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());
    let media = ServeDir::new(state.media().root());

    routes()
        .nest_service(MEDIA_URL_PREFIX, media)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;
    use url::Url;

    use super::*;
    use crate::services::LegacyApiClient;

    fn test_app() -> Router {
        let config = crate::config::tests::config();
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://dn:dn@127.0.0.1:1/dn")
            .unwrap();
        let legacy = LegacyApiClient::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
        app(AppState::new(config, pool, legacy), MemoryStore::default())
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "196.25.1.1")
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some("abc")), 50);
        assert_eq!(clamp_limit(Some("0")), 1);
        assert_eq!(clamp_limit(Some("-4")), 1);
        assert_eq!(clamp_limit(Some("7.9")), 7);
        assert_eq!(clamp_limit(Some("1000")), 100);
        assert_eq!(clamp_limit(Some("inf")), 50);
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = test_app().oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id_and_noindex() {
        let response = test_app().oneshot(request("GET", "/health")).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            response.headers().get("x-robots-tag").unwrap(),
            "noindex, nofollow"
        );
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let response = test_app()
            .oneshot(request("GET", "/health/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_pages_redirect_to_login() {
        for uri in ["/", "/orders", "/products/detox-60/edit", "/journal"] {
            let response = test_app().oneshot(request("GET", uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
            assert_eq!(response.headers().get("location").unwrap(), "/auth/login");
        }
    }

    #[tokio::test]
    async fn test_api_requires_login_with_json_401() {
        let cases = [
            ("GET", "/api/orders"),
            ("POST", "/api/products"),
            ("DELETE", "/api/journal/abc"),
            ("GET", "/api/proxy?path=/orders.php"),
        ];
        for (method, uri) in cases {
            let response = test_app().oneshot(request(method, uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            let json: serde_json::Value =
                serde_json::from_str(&body_string(response).await).unwrap();
            assert_eq!(json["error"], "Not logged in");
        }
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app()
            .oneshot(request("GET", "/auth/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_logout_redirects_to_login() {
        let response = test_app()
            .oneshot(request("POST", "/auth/logout"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/auth/login");
    }

    #[tokio::test]
    async fn test_media_is_served_from_media_dir() {
        let response = test_app()
            .oneshot(request("GET", "/media/products/detox-60/missing.png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
