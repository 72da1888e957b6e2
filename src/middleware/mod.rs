//! Middleware module
//!
//! Contains the internal token check applied to proxied routes.

pub mod auth;
