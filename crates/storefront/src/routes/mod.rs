//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Products
//! GET  /products               - Product listing
//! GET  /products/{id}          - Product detail
//! GET  /api/products           - Catalog as JSON
//! GET  /api/products/{id}      - One product as JSON
//! GET  /api/products/{id}/images/{n} - Stored product image
//!
//! # Content
//! GET  /api/testimonials       - Published testimonials as JSON
//! GET  /journal                - Journal index
//! GET  /journal/{slug}         - Journal post
//!
//! # Cart
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart
//! POST /cart/update            - Set quantity (0 removes)
//! POST /cart/remove            - Remove line
//! POST /cart/clear             - Empty cart
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /api/cart               - Cart as JSON
//!
//! # Checkout
//! GET  /checkout               - Current step
//! POST /checkout/customer      - Submit contact details
//! POST /checkout/shipping      - Submit shipping address
//! POST /checkout/payment       - Submit payment method
//! POST /checkout/back          - Previous step
//! POST /checkout/place-order   - Persist order, clear cart
//! GET  /order-confirmation/{number}
//!
//! # Account
//! GET  /account/login          - Login page
//! POST /account/login          - Login action (rate limited)
//! GET  /account/register       - Register page
//! POST /account/register       - Register action (rate limited)
//! POST /account/logout         - Logout action
//! GET  /account                - Overview (requires auth)
//! GET  /account/profile        - Profile form
//! POST /account/profile        - Save profile
//! GET  /account/orders         - Order history
//! GET  /account/addresses      - Address book
//! POST /account/addresses      - Add address
//! POST /account/addresses/{id} - Update address
//! POST /account/addresses/{id}/delete - Delete address
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod journal;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::middleware::{
    create_session_layer, login_rate_limiter, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory served under `/static`.
const STATIC_DIR: &str = "crates/storefront/static";

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::api_list))
        .route("/products/{id}", get(products::api_show))
        .route("/products/{id}/images/{index}", get(products::image))
        .route("/testimonials", get(journal::api_testimonials))
        .route("/cart", get(cart::api))
}

/// Create the journal routes router.
pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(journal::index))
        .route("/{slug}", get(journal::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/customer", post(checkout::submit_customer))
        .route("/shipping", post(checkout::submit_shipping))
        .route("/payment", post(checkout::submit_payment))
        .route("/back", post(checkout::back))
        .route("/place-order", post(checkout::place))
}

/// Create the account routes router.
///
/// Login and registration POSTs sit behind the per-IP rate limiter.
pub fn account_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(login_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .merge(limited)
        .route("/logout", post(auth::logout))
        .route("/", get(account::index))
        .route(
            "/profile",
            get(account::profile_page).post(account::update_profile),
        )
        .route("/orders", get(account::orders))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/products", product_routes())
        .nest("/api", api_routes())
        .nest("/journal", journal_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/order-confirmation/{number}", get(orders::confirmation))
        .nest("/account", account_routes())
}

/// Build the full application with middleware, over any session store.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());

    routes()
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
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::StorefrontConfig;

    fn test_app() -> Router {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://dn:dn@127.0.0.1:1/dn"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("k9$Lm2@xQ7!pR4#vZ8&wT1*bN6^cY3%d"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://dn:dn@127.0.0.1:1/dn")
            .unwrap();
        app(AppState::new(config, pool), MemoryStore::default())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "196.25.1.1")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = test_app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id_and_security_headers() {
        let response = test_app().oneshot(get_request("/health")).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            response.headers().get("x-frame-options").unwrap(),
            "DENY"
        );
    }

    #[tokio::test]
    async fn test_readiness_reports_unreachable_database() {
        let response = test_app()
            .oneshot(get_request("/health/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_account_requires_login() {
        let response = test_app().oneshot(get_request("/account")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/account/login"
        );
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app()
            .oneshot(get_request("/account/login"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_empty_cart_json_without_database() {
        let response = test_app().oneshot(get_request("/api/cart")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["item_count"], 0);
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_redirects() {
        let response = test_app().oneshot(get_request("/checkout")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/cart");
    }

    #[tokio::test]
    async fn test_malformed_product_id_is_rejected() {
        let response = test_app()
            .oneshot(get_request("/api/products/Not%20A%20Slug"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_index_out_of_range_is_rejected() {
        let response = test_app()
            .oneshot(get_request("/api/products/detox-60/images/21"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
