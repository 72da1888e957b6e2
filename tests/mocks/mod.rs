//! Mock infrastructure for testing external services
//!
//! Provides a wiremock-based upstream that stands in for every provider.

pub mod upstream;

pub use upstream::*;
