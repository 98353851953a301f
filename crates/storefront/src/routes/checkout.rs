//! Checkout route handlers.
//!
//! One page renders whichever of the four steps the session is on. Each
//! step posts to its own endpoint; a failing step re-renders the page with
//! the error and keeps what the shopper typed. Placing the order persists
//! it first and only then clears the cart and checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use delightful_naturals_core::cart::Cart;
use delightful_naturals_core::checkout::{
    CheckoutState, CheckoutStep, CustomerInfo, PaymentInput, SOUTH_AFRICAN_PROVINCES,
    ShippingAddress,
};
use delightful_naturals_core::order::Order;
use delightful_naturals_core::{AddressKind, PaymentMethodKind};

use crate::db::CustomerRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentCustomer, session_keys};
use crate::routes::cart::{load_cart, save_cart};
use crate::services::orders::{PlaceOrderError, place_order};
use crate::state::AppState;

/// Payment methods offered on step 3, in display order.
const PAYMENT_METHODS: [PaymentMethodKind; 3] = [
    PaymentMethodKind::Card,
    PaymentMethodKind::Eft,
    PaymentMethodKind::Cash,
];

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub checkout: CheckoutState,
    pub cart: Cart,
    pub steps: [CheckoutStep; 4],
    pub provinces: [&'static str; 9],
    pub payment_methods: [PaymentMethodKind; 3],
    pub error: Option<String>,
}

impl CheckoutTemplate {
    fn new(checkout: CheckoutState, cart: Cart, error: Option<String>) -> Self {
        Self {
            checkout,
            cart,
            steps: CheckoutStep::ALL,
            provinces: SOUTH_AFRICAN_PROVINCES,
            payment_methods: PAYMENT_METHODS,
            error,
        }
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // askama loop items are references
    fn is_step(&self, step: &CheckoutStep) -> bool {
        self.checkout.step == *step
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    fn is_done(&self, step: &CheckoutStep) -> bool {
        step.number() < self.checkout.step.number()
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_checkout(session: &Session) -> CheckoutState {
    session
        .get::<CheckoutState>(session_keys::CHECKOUT)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save_checkout(session: &Session, checkout: &CheckoutState) -> Result<()> {
    session.insert(session_keys::CHECKOUT, checkout).await?;
    Ok(())
}

/// Fill empty step 1 and 2 fields from the logged-in customer's account.
async fn prefill(state: &AppState, checkout: &mut CheckoutState, customer: &CurrentCustomer) {
    if checkout.customer.email.trim().is_empty() {
        checkout.customer.email = customer.email.to_string();
    }

    let repo = CustomerRepository::new(state.pool());
    if checkout.customer.first_name.trim().is_empty() {
        match repo.get_by_id(customer.id).await {
            Ok(Some(account)) => {
                checkout.customer.first_name = account.first_name;
                checkout.customer.last_name = account.last_name;
                checkout.customer.phone = account.phone;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to prefill checkout from account: {e}"),
        }
    }

    if checkout.shipping.address.trim().is_empty() {
        match repo.default_address(customer.id, AddressKind::Shipping).await {
            Ok(Some(address)) => checkout.shipping = ShippingAddress::from(&address),
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to prefill checkout address: {e}"),
        }
    }
}

/// Re-render the checkout page with an error.
fn rejected(checkout: CheckoutState, cart: Cart, error: impl ToString) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutTemplate::new(checkout, cart, Some(error.to_string())),
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the current checkout step. An empty cart goes back to `/cart`.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let cart = load_cart(&state, &session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let mut checkout = load_checkout(&session).await;
    if let Some(customer) = &customer {
        prefill(&state, &mut checkout, customer).await;
    }

    Ok(CheckoutTemplate::new(checkout, cart, None).into_response())
}

/// Step 1: customer details.
#[instrument(skip_all)]
pub async fn submit_customer(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CustomerInfo>,
) -> Result<Response> {
    let mut checkout = load_checkout(&session).await;
    let result = checkout.submit_customer(form);
    save_checkout(&session, &checkout).await?;

    match result {
        Ok(()) => Ok(Redirect::to("/checkout").into_response()),
        Err(e) => Ok(rejected(checkout, load_cart(&state, &session).await?, e)),
    }
}

/// Step 2: shipping address.
#[instrument(skip_all)]
pub async fn submit_shipping(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ShippingAddress>,
) -> Result<Response> {
    let mut checkout = load_checkout(&session).await;
    let result = checkout.submit_shipping(form);
    save_checkout(&session, &checkout).await?;

    match result {
        Ok(()) => Ok(Redirect::to("/checkout").into_response()),
        Err(e) => Ok(rejected(checkout, load_cart(&state, &session).await?, e)),
    }
}

/// Step 3: payment. Only the method, cardholder name and last four digits
/// are kept.
#[instrument(skip_all)]
pub async fn submit_payment(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentInput>,
) -> Result<Response> {
    let mut checkout = load_checkout(&session).await;
    let result = checkout.submit_payment(form);
    save_checkout(&session, &checkout).await?;

    match result {
        Ok(()) => Ok(Redirect::to("/checkout").into_response()),
        Err(e) => Ok(rejected(checkout, load_cart(&state, &session).await?, e)),
    }
}

/// Go back one step.
#[instrument(skip_all)]
pub async fn back(session: Session) -> Result<Response> {
    let mut checkout = load_checkout(&session).await;
    checkout.back();
    save_checkout(&session, &checkout).await?;
    Ok(Redirect::to("/checkout").into_response())
}

/// Step 4: place the order.
///
/// The order is inserted first. Only once that succeeds are the cart and
/// checkout cleared and the shopper sent to the confirmation page; a failed
/// insert leaves both untouched.
#[instrument(skip_all)]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let cart = load_cart(&state, &session).await?;
    let checkout = load_checkout(&session).await;

    let outcome = place_order(state.pool(), &checkout, &cart, customer.map(|c| c.id)).await;
    finish_place(&session, checkout, cart, outcome).await
}

/// Clear the cart and checkout after a successful insert, or re-render
/// with the error and leave the session as it was.
async fn finish_place(
    session: &Session,
    checkout: CheckoutState,
    cart: Cart,
    outcome: std::result::Result<Order, PlaceOrderError>,
) -> Result<Response> {
    let order = match outcome {
        Ok(order) => order,
        Err(PlaceOrderError::Checkout(e)) => return Ok(rejected(checkout, cart, e)),
        Err(PlaceOrderError::Email(e)) => return Ok(rejected(checkout, cart, e)),
        Err(PlaceOrderError::Repository(e)) => return Err(AppError::Database(e)),
    };

    save_cart(session, &Cart::new()).await?;
    session.remove::<CheckoutState>(session_keys::CHECKOUT).await?;
    session
        .insert(session_keys::LAST_ORDER, order.number.as_str())
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", order.number.as_str())]),
    );
    Ok(Redirect::to(&format!("/order-confirmation/{}", order.number)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;
    use tower_sessions::MemoryStore;

    use delightful_naturals_core::ProductId;
    use delightful_naturals_core::cart::{CartAction, CartProduct, StoredCartLine};

    use super::*;

    fn reviewed_checkout() -> CheckoutState {
        let mut checkout = CheckoutState::new();
        checkout
            .submit_customer(CustomerInfo {
                first_name: "Thandi".to_string(),
                last_name: "Mokoena".to_string(),
                email: "thandi@example.co.za".to_string(),
                phone: "0821234567".to_string(),
            })
            .unwrap();
        checkout
            .submit_shipping(ShippingAddress {
                address: "12 Long Street".to_string(),
                city: "Cape Town".to_string(),
                province: "Western Cape".to_string(),
                postal_code: "8001".to_string(),
                country: String::new(),
            })
            .unwrap();
        checkout
            .submit_payment(PaymentInput {
                method: PaymentMethodKind::Eft,
                ..PaymentInput::default()
            })
            .unwrap();
        checkout
    }

    fn cart_with_item() -> Cart {
        let mut cart = Cart::new();
        cart.apply(CartAction::Add {
            product: CartProduct {
                id: ProductId::parse("detox-60").unwrap(),
                name: "Detox".to_string(),
                size: "60ml".to_string(),
                price: Decimal::from(300),
                image: None,
                in_stock: true,
            },
            quantity: 2,
        });
        cart
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_cart_and_checkout_in_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let checkout = reviewed_checkout();
        let cart = cart_with_item();
        save_cart(&session, &cart).await.unwrap();
        save_checkout(&session, &checkout).await.unwrap();

        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://dn:dn@127.0.0.1:1/dn")
            .unwrap();
        let outcome = place_order(&pool, &checkout, &cart, None).await;
        assert!(matches!(outcome, Err(PlaceOrderError::Repository(_))));

        let result = finish_place(&session, checkout.clone(), cart.clone(), outcome).await;
        assert!(matches!(result, Err(AppError::Database(_))));

        let stored: Vec<StoredCartLine> = session
            .get(session_keys::CART)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, cart.to_stored());
        assert_eq!(load_checkout(&session).await, checkout);
        assert!(
            session
                .get::<String>(session_keys::LAST_ORDER)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_rejected_checkout_re_renders_without_clearing() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let checkout = CheckoutState::new();
        let cart = cart_with_item();
        save_cart(&session, &cart).await.unwrap();

        let response = finish_place(
            &session,
            checkout,
            cart.clone(),
            Err(PlaceOrderError::Checkout(
                delightful_naturals_core::checkout::CheckoutError::NotAtReview,
            )),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let stored: Vec<StoredCartLine> = session
            .get(session_keys::CART)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, cart.to_stored());
    }
}
