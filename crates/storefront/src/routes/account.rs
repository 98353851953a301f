//! Account route handlers.
//!
//! Every route here requires a logged-in customer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use delightful_naturals_core::checkout::SOUTH_AFRICAN_PROVINCES;
use delightful_naturals_core::customer::{Address, AddressInput, Customer};
use delightful_naturals_core::order::Order;
use delightful_naturals_core::{AddressId, AddressKind, CustomerId};

use crate::db::customers::CustomerProfile;
use crate::db::{CustomerRepository, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::auth::RequireAuth;
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 3;

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub customer: Customer,
    pub recent_orders: Vec<Order>,
    pub default_address: Option<Address>,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/profile.html")]
pub struct ProfileTemplate {
    pub customer: Customer,
    pub error: Option<String>,
    pub saved: bool,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub orders: Vec<Order>,
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub addresses: Vec<Address>,
    pub provinces: [&'static str; 9],
    pub kinds: [AddressKind; 2],
    pub error: Option<String>,
}

async fn load_customer(state: &AppState, id: CustomerId) -> Result<Customer> {
    CustomerRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
}

async fn addresses_page(
    state: &AppState,
    customer_id: CustomerId,
    status: StatusCode,
    error: Option<String>,
) -> Result<Response> {
    let addresses = CustomerRepository::new(state.pool())
        .list_addresses(customer_id)
        .await?;
    Ok((
        status,
        AddressesTemplate {
            addresses,
            provinces: SOUTH_AFRICAN_PROVINCES,
            kinds: [AddressKind::Shipping, AddressKind::Billing],
            error,
        },
    )
        .into_response())
}

/// Display account overview page.
#[instrument(skip_all, fields(customer_id = %current.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let customer = load_customer(&state, current.id).await?;

    let mut recent_orders = OrderRepository::new(state.pool())
        .list_for_customer(current.id)
        .await?;
    recent_orders.truncate(RECENT_ORDERS);

    let default_address = CustomerRepository::new(state.pool())
        .default_address(current.id, AddressKind::Shipping)
        .await?;

    Ok(AccountIndexTemplate {
        customer,
        recent_orders,
        default_address,
    })
}

/// Display the profile form.
#[instrument(skip_all, fields(customer_id = %current.id))]
pub async fn profile_page(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let customer = load_customer(&state, current.id).await?;
    Ok(ProfileTemplate {
        customer,
        error: None,
        saved: false,
    })
}

/// Save profile changes.
#[instrument(skip_all, fields(customer_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    if form.first_name.trim().is_empty() || form.last_name.trim().is_empty() {
        let customer = load_customer(&state, current.id).await?;
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            ProfileTemplate {
                customer,
                error: Some("First and last name are required".to_string()),
                saved: false,
            },
        )
            .into_response());
    }

    let profile = CustomerProfile {
        first_name: form.first_name,
        last_name: form.last_name,
        phone: form.phone,
    };
    let customer = CustomerRepository::new(state.pool())
        .update_profile(current.id, &profile)
        .await?;

    // Keep the header name in sync without cycling the session ID.
    session
        .insert(
            session_keys::CURRENT_CUSTOMER,
            CurrentCustomer::from(&customer),
        )
        .await?;

    Ok(ProfileTemplate {
        customer,
        error: None,
        saved: true,
    }
    .into_response())
}

/// Order history, newest first.
#[instrument(skip_all, fields(customer_id = %current.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<impl IntoResponse> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(current.id)
        .await?;
    Ok(OrdersTemplate { orders })
}

/// Address book.
#[instrument(skip_all, fields(customer_id = %current.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Response> {
    addresses_page(&state, current.id, StatusCode::OK, None).await
}

/// Add an address. A new default replaces the old default of its kind.
#[instrument(skip_all, fields(customer_id = %current.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(mut form): Form<AddressInput>,
) -> Result<Response> {
    if let Err(e) = form.normalize_and_validate() {
        return addresses_page(
            &state,
            current.id,
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(e.to_string()),
        )
        .await;
    }

    CustomerRepository::new(state.pool())
        .create_address(current.id, &form)
        .await?;
    Ok(Redirect::to("/account/addresses").into_response())
}

/// Replace one of the customer's addresses.
#[instrument(skip_all, fields(customer_id = %current.id, address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<AddressId>,
    Form(mut form): Form<AddressInput>,
) -> Result<Response> {
    if let Err(e) = form.normalize_and_validate() {
        return addresses_page(
            &state,
            current.id,
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(e.to_string()),
        )
        .await;
    }

    match CustomerRepository::new(state.pool())
        .update_address(current.id, id, &form)
        .await
    {
        Ok(_) => Ok(Redirect::to("/account/addresses").into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("address {id}"))),
        Err(e) => Err(e.into()),
    }
}

/// Delete one of the customer's addresses.
#[instrument(skip_all, fields(customer_id = %current.id, address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    match CustomerRepository::new(state.pool())
        .delete_address(current.id, id)
        .await
    {
        Ok(()) => Ok(Redirect::to("/account/addresses").into_response()),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound(format!("address {id}"))),
        Err(e) => Err(e.into()),
    }
}
