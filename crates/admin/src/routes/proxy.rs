//! Pass-through to the legacy REST API.
//!
//! `GET|POST /api/proxy?path=/orders.php&...` forwards to the configured
//! legacy base URL. Only allow-listed paths are reachable.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, header},
};
use serde_json::Value;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::{RequireAdminAuth, RequireAdminWrite};
use crate::services::proxy::ProxyRequest;
use crate::state::AppState;

/// Split the query string into the target path and the remaining parameters.
fn proxy_request(
    params: Vec<(String, String)>,
    headers: &HeaderMap,
    body: Bytes,
) -> ProxyRequest {
    let mut path = None;
    let mut rest = Vec::with_capacity(params.len());
    for (key, value) in params {
        if key == "path" && path.is_none() {
            path = Some(value);
        } else {
            rest.push((key, value));
        }
    }

    ProxyRequest {
        path,
        params: rest,
        authorization: headers.get(header::AUTHORIZATION).cloned(),
        body,
    }
}

/// `GET /api/proxy`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn get(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let request = proxy_request(params, &headers, Bytes::new());
    let payload = state.legacy().forward(Method::GET, request).await?;
    Ok(Json(payload))
}

/// `POST /api/proxy` - the request body is forwarded as-is.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn post(
    RequireAdminWrite(admin): RequireAdminWrite,
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let request = proxy_request(params, &headers, body);
    let payload = state.legacy().forward(Method::POST, request).await?;
    Ok(Json(payload))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_proxy_request_splits_path_from_params() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0k"));

        let request = proxy_request(
            vec![
                ("status".to_string(), "pending".to_string()),
                ("path".to_string(), "/orders.php".to_string()),
                ("path".to_string(), "/admin.php".to_string()),
            ],
            &headers,
            Bytes::from_static(b"{}"),
        );

        assert_eq!(request.path.as_deref(), Some("/orders.php"));
        assert_eq!(
            request.params,
            vec![
                ("status".to_string(), "pending".to_string()),
                ("path".to_string(), "/admin.php".to_string()),
            ]
        );
        assert_eq!(request.authorization.unwrap(), "Bearer t0k");
        assert_eq!(&request.body[..], b"{}");
    }
}
