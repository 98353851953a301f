//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password authentication for admin users
//! - `coerce` - Lenient field coercion for editor JSON bodies
//! - `content` - Testimonial and journal submissions
//! - `products` - Product editor submissions and image payloads
//! - `proxy` - Allow-listed client for the legacy REST API

pub mod auth;
pub mod coerce;
pub mod content;
pub mod products;
pub mod proxy;

pub use auth::{AdminAuthService, AuthError};
pub use content::{ContentError, parse_journal_post, parse_testimonial};
pub use products::{ProductSubmission, SubmissionError, parse_submission};
pub use proxy::{LegacyApiClient, ProxyError, ProxyRequest};
