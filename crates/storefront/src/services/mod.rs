//! Business logic services for the storefront.
//!
//! - `auth` - Customer registration and password login
//! - `orders` - Order placement from a reviewed checkout
//! - `catalog` - Cached catalog reads

pub mod auth;
pub mod catalog;
pub mod orders;
