//! Integration tests for Delightful Naturals.
//!
//! Every test talks to running servers over HTTP and is `#[ignore]`d by
//! default.
//!
//! ```bash
//! cargo run -p delightful-naturals-cli -- migrate
//! cargo run -p delightful-naturals-cli -- seed crates/cli/seed/catalog.yaml
//! cargo run -p delightful-naturals-storefront &
//! cargo run -p delightful-naturals-admin &
//! cargo test -p delightful-naturals-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_URL` - Storefront base URL (default: `http://localhost:3000`)
//! - `ADMIN_URL` - Admin base URL (default: `http://localhost:3001`)
//! - `ADMIN_TEST_EMAIL` / `ADMIN_TEST_PASSWORD` - A write-capable admin account
//! - `ADMIN_TEST_VIEWER_EMAIL` / `ADMIN_TEST_VIEWER_PASSWORD` - A viewer account

use reqwest::{Client, StatusCode, redirect::Policy};

/// Storefront base URL.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Admin base URL.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A cookie-keeping client that does not follow redirects, so tests can
/// assert on `303 See Other` and its `Location`.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A client signed in to the admin as the account named by
/// `{prefix}_EMAIL` / `{prefix}_PASSWORD`.
///
/// # Panics
///
/// Panics if the variables are unset or the login is refused.
pub async fn admin_client(prefix: &str) -> Client {
    let email = std::env::var(format!("{prefix}_EMAIL"))
        .unwrap_or_else(|_| panic!("{prefix}_EMAIL must be set"));
    let password = std::env::var(format!("{prefix}_PASSWORD"))
        .unwrap_or_else(|_| panic!("{prefix}_PASSWORD must be set"));

    let client = client();
    let resp = client
        .post(format!("{}/auth/login", admin_url()))
        .form(&[("email", email.as_str()), ("password", password.as_str())])
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "admin login refused");
    client
}

/// The `Location` header of a redirect.
///
/// # Panics
///
/// Panics if the response has no `Location`.
#[must_use]
pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("response has no Location header")
        .to_string()
}
