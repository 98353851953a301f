//! Unified error handling for admin.
//!
//! Every error renders as a JSON body `{"error": "..."}` so the editor
//! scripts and API callers can show the message. Proxy failures also carry
//! the upstream payload.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::content::ContentError;
use crate::services::products::SubmissionError;
use crate::services::proxy::ProxyError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the accepted size.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The legacy REST API answered with an error status.
    #[error("Upstream error {status}: {message}")]
    Upstream {
        status: StatusCode,
        message: String,
        payload: Value,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_)
            ) | Self::Internal(_)
        )
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { status, .. } => *status,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(RepositoryError::Database(err))
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::UserNotFound => {
                Self::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::UserAlreadyExists => {
                Self::BadRequest("Admin user already exists".to_string())
            }
            AuthError::WeakPassword(msg) => Self::BadRequest(msg),
            AuthError::Repository(e) => Self::Database(e),
            AuthError::PasswordHash => Self::Internal("password hashing failed".to_string()),
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::ImageTooLarge(_) => Self::PayloadTooLarge(err.to_string()),
            SubmissionError::InvalidProductId
            | SubmissionError::PriceOutOfRange(_)
            | SubmissionError::InvalidImageIndex(_)
            | SubmissionError::InvalidImageData(_) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ProxyError> for AppError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::MissingPath => Self::BadRequest(err.to_string()),
            ProxyError::PathNotAllowed => Self::Forbidden(err.to_string()),
            ProxyError::Upstream {
                status,
                message,
                payload,
            } => Self::Upstream {
                status,
                message,
                payload,
            },
            ProxyError::Transport(_) | ProxyError::Url(_) => {
                Self::Internal(format!("legacy API: {err}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();

        let body = match self {
            Self::Database(RepositoryError::NotFound) => json!({ "error": "Not found" }),
            Self::Database(RepositoryError::Conflict(msg)) => json!({ "error": msg }),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::Upstream {
                message, payload, ..
            } => json!({ "error": message, "payload": payload }),
            Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg) => json!({ "error": msg }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> Value {
        let bytes = err
            .into_response()
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 42".to_string());
        assert_eq!(err.to_string(), "Not found: order 42");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::PayloadTooLarge("test".to_string())),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_errors_return_their_message() {
        let json = body_json(AppError::BadRequest("Invalid product id".to_string())).await;
        assert_eq!(json["error"], "Invalid product id");
    }

    #[tokio::test]
    async fn test_internal_errors_are_generic() {
        let json = body_json(AppError::Internal("disk on fire".to_string())).await;
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_status_and_payload() {
        let err = AppError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: "Bad Gateway".to_string(),
            payload: json!({ "detail": "down" }),
        };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(err).await;
        assert_eq!(json["error"], "Bad Gateway");
        assert_eq!(json["payload"]["detail"], "down");
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            get_status(AppError::from(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::from(AuthError::PasswordHash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_oversized_image_is_413_with_message() {
        let err = AppError::from(SubmissionError::ImageTooLarge("hero.webp".to_string()));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(err).await;
        assert_eq!(
            json["error"],
            "Image hero.webp is too large after compression (> 950KB)"
        );
    }

    #[test]
    fn test_price_out_of_range_is_400() {
        let err = AppError::from(SubmissionError::PriceOutOfRange(Decimal::from(100_000_000_000_i64)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_proxy_error_mapping() {
        assert_eq!(
            get_status(AppError::from(ProxyError::MissingPath)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::from(ProxyError::PathNotAllowed)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::from(ContentError::TitleRequired)),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_missing_row_is_404() {
        let err = AppError::from(RepositoryError::NotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(err).await["error"], "Not found");
    }
}
