//! Core types for Delightful Naturals.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price, format_zar};
pub use product::{ProductId, ProductIdError, clamp_rating, clamp_reviews, clamp_testimonial_rating};
pub use status::*;
