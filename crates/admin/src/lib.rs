//! Delightful Naturals Admin library.
//!
//! This crate provides the back-office functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Security
//!
//! This crate can change the catalog, orders and published content. Every
//! page and API route except `/health` and the login form requires an
//! authenticated admin; viewers are read-only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod media;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
