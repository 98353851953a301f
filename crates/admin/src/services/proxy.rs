//! Client for the legacy PHP REST API.
//!
//! The back-office reaches the older API only through this allow-listed
//! proxy. Requests are forwarded with a JSON content type and the caller's
//! `Authorization` header; responses are returned as JSON.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Paths the proxy forwards.
pub const ALLOWED_PATHS: [&str; 3] = ["/customers.php", "/orders.php", "/products.php"];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when proxying to the legacy API.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No `path` query parameter.
    #[error("Path parameter is required")]
    MissingPath,

    /// The path is not on the allow-list.
    #[error("Path not allowed")]
    PathNotAllowed,

    /// The upstream answered with a non-success status.
    #[error("{message}")]
    Upstream {
        status: StatusCode,
        message: String,
        payload: Value,
    },

    /// The request could not be built or sent.
    #[error("Failed to fetch from API")]
    Transport(#[from] reqwest::Error),

    /// The configured base URL and path do not form a URL.
    #[error("Failed to fetch from API")]
    Url(#[from] url::ParseError),
}

/// A request to forward.
#[derive(Debug, Default)]
pub struct ProxyRequest {
    /// Allow-listed path, optionally with its own query string.
    pub path: Option<String>,
    /// Every other query parameter, in order.
    pub params: Vec<(String, String)>,
    pub authorization: Option<HeaderValue>,
    pub body: Bytes,
}

/// Check a requested path against [`ALLOWED_PATHS`].
///
/// The part before any `?` must equal an allowed path exactly.
///
/// # Errors
///
/// Returns `ProxyError::MissingPath` for a missing or blank path and
/// `ProxyError::PathNotAllowed` for anything off the list.
pub fn check_path(path: Option<&str>) -> Result<&str, ProxyError> {
    let path = path.map(str::trim).filter(|p| !p.is_empty()).ok_or(ProxyError::MissingPath)?;
    let route = path.split_once('?').map_or(path, |(route, _)| route);
    if ALLOWED_PATHS.contains(&route) {
        Ok(path)
    } else {
        Err(ProxyError::PathNotAllowed)
    }
}

/// Legacy API client.
#[derive(Clone)]
pub struct LegacyApiClient {
    inner: Arc<LegacyApiClientInner>,
}

struct LegacyApiClientInner {
    client: reqwest::Client,
    base: Url,
}

impl LegacyApiClient {
    /// Create a new legacy API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base: Url) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(LegacyApiClientInner { client, base }),
        })
    }

    /// Build the upstream URL for an allow-listed path and extra parameters.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Url` if the result is not a valid URL.
    pub fn url_for(&self, path: &str, params: &[(String, String)]) -> Result<Url, ProxyError> {
        let base = self.inner.base.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Forward a request and return the upstream JSON.
    ///
    /// A successful response whose body is not JSON yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns a path error before any network call, `ProxyError::Upstream`
    /// for a non-success status, and `ProxyError::Transport` if the request
    /// fails.
    pub async fn forward(&self, method: Method, request: ProxyRequest) -> Result<Value, ProxyError> {
        let path = check_path(request.path.as_deref())?;
        let url = self.url_for(path, &request.params)?;

        let mut builder = self
            .inner
            .client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(auth) = request.authorization {
            builder = builder.header(AUTHORIZATION, auth);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%status, %method, path, "Legacy API returned an error");
            let payload = upstream_payload(&text);
            return Err(ProxyError::Upstream {
                status,
                message: status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
                payload,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::Null))
    }
}

/// Error bodies are returned as JSON when they parse, else as raw text.
fn upstream_payload(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> LegacyApiClient {
        LegacyApiClient::new(Url::parse("http://api.delightfulnaturals.co.za").unwrap()).unwrap()
    }

    #[test]
    fn test_check_path_requires_path() {
        assert!(matches!(check_path(None), Err(ProxyError::MissingPath)));
        assert!(matches!(check_path(Some("  ")), Err(ProxyError::MissingPath)));
    }

    #[test]
    fn test_check_path_allow_list() {
        assert_eq!(check_path(Some("/orders.php")).unwrap(), "/orders.php");
        assert_eq!(
            check_path(Some("/customers.php?id=4")).unwrap(),
            "/customers.php?id=4"
        );
        assert!(matches!(
            check_path(Some("/admin.php")),
            Err(ProxyError::PathNotAllowed)
        ));
        assert!(matches!(
            check_path(Some("/orders.php/../admin.php")),
            Err(ProxyError::PathNotAllowed)
        ));
        assert!(matches!(
            check_path(Some("orders.php")),
            Err(ProxyError::PathNotAllowed)
        ));
    }

    #[test]
    fn test_url_for_appends_params() {
        let url = client()
            .url_for(
                "/orders.php",
                &[
                    ("status".to_string(), "pending".to_string()),
                    ("page".to_string(), "2".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://api.delightfulnaturals.co.za/orders.php?status=pending&page=2"
        );
    }

    #[test]
    fn test_url_for_keeps_embedded_query() {
        let url = client()
            .url_for("/customers.php?id=4", &[("x".to_string(), "1".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://api.delightfulnaturals.co.za/customers.php?id=4&x=1"
        );
    }

    #[test]
    fn test_upstream_payload() {
        assert_eq!(upstream_payload(""), Value::Null);
        assert_eq!(upstream_payload("{\"a\":1}")["a"], 1);
        assert_eq!(upstream_payload("oops"), Value::String("oops".to_string()));
    }

    #[tokio::test]
    async fn test_forward_rejects_disallowed_path_without_network() {
        let request = ProxyRequest {
            path: Some("/secrets.php".to_string()),
            ..ProxyRequest::default()
        };
        let err = client().forward(Method::GET, request).await.unwrap_err();
        assert!(matches!(err, ProxyError::PathNotAllowed));
    }
}
