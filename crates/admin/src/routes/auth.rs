//! Authentication route handlers for admin.
//!
//! Email and password login with Argon2 hashes. Accounts are created from
//! the CLI; there is no self-service registration.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::auth::OptionalAdminAuth;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::auth::{AdminAuthService, AuthError};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Render the login page, or go to the dashboard when already signed in.
///
/// GET /auth/login
pub async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
///
/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AdminAuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            set_current_admin(&session, &CurrentAdmin::from(&user)).await?;
            tracing::info!(admin_id = %user.id, role = %user.role, "Admin logged in");
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials | AuthError::UserNotFound) => {
            tracing::warn!("Admin login failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate {
                    email: form.email,
                    error: Some("Invalid email or password".to_string()),
                },
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    Ok(Redirect::to("/auth/login"))
}
