//! Delightful Naturals Core - shared domain types and storefront logic.
//!
//! This crate is used by every Delightful Naturals component:
//! - `storefront` - Public shop (catalog, cart, checkout, accounts)
//! - `admin` - Back-office for products, orders, customers and content
//! - `cli` - Migrations, admin user management and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains types and pure state transitions only: no I/O,
//! no database access, no HTTP. The cart reducer and the checkout step
//! machine live here so both binaries (and their tests) share one
//! implementation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, product slugs, prices, emails and statuses
//! - [`cart`] - Cart line items and the cart reducer
//! - [`checkout`] - The four-step checkout flow and its validation
//! - [`catalog`] - Product and product image records
//! - [`order`] - Order numbers, order items and placed orders
//! - [`customer`] - Customer accounts and addresses
//! - [`content`] - Testimonials and journal posts
//! - [`slug`] - URL slug derivation for journal posts
//!
//! With the `postgres` feature the records derive `sqlx::FromRow` and the
//! newtypes implement `sqlx` encoding, so both binaries decode rows straight
//! into these types.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod customer;
pub mod order;
pub mod slug;
pub mod types;

pub use types::*;
