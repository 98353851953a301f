//! Customer login, registration and logout.

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

use crate::db::customers::CustomerProfile;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user, user_message};
use crate::filters;
use crate::middleware::{clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH, Registration};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub error: Option<String>,
}

/// Register page template. Echoes everything except the password.
#[derive(Template, WebTemplate)]
#[template(path = "account/register.html")]
pub struct RegisterTemplate {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub min_password_length: usize,
    pub error: Option<String>,
}

impl RegisterTemplate {
    fn from_form(form: &RegisterForm, error: Option<String>) -> Self {
        Self {
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone: form.phone.clone(),
            min_password_length: MIN_PASSWORD_LENGTH,
            error,
        }
    }
}

/// Log a customer in on this session.
async fn start_session(
    session: &Session,
    customer: &delightful_naturals_core::customer::Customer,
) -> Result<()> {
    set_current_customer(session, &CurrentCustomer::from(customer)).await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    Ok(())
}

/// Status for a form re-render after an auth failure.
const fn rejection_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::CustomerNotFound => StatusCode::UNAUTHORIZED,
        AuthError::CustomerAlreadyExists => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        email: String::new(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(customer) => {
            start_session(&session, &customer).await?;
            tracing::info!(customer_id = %customer.id, "Customer logged in");
            Ok(Redirect::to("/account").into_response())
        }
        Err(e) if e.is_client_error() => {
            tracing::warn!("Login failed: {e}");
            Ok((
                rejection_status(&e),
                LoginTemplate {
                    email: form.email,
                    error: Some(user_message(&e)),
                },
            )
                .into_response())
        }
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// Display the registration page.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate::from_form(&RegisterForm::default(), None)
}

/// Handle registration. New customers are logged in straight away.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let registration = Registration {
        email: form.email.clone(),
        password: form.password.clone(),
        profile: CustomerProfile {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            phone: form.phone.clone(),
        },
    };

    match AuthService::new(state.pool()).register(&registration).await {
        Ok(customer) => {
            start_session(&session, &customer).await?;
            tracing::info!(customer_id = %customer.id, "Customer registered");
            Ok(Redirect::to("/account").into_response())
        }
        Err(e) if e.is_client_error() => Ok((
            rejection_status(&e),
            RegisterTemplate::from_form(&form, Some(user_message(&e))),
        )
            .into_response()),
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// Log out. Cart and checkout stay on the session.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_customer(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/").into_response())
}
