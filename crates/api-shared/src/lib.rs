//! # API Shared
//!
//! Shared utilities and definitions for the carebook HTTP surface.
//!
//! Contains:
//! - Bearer-token helpers (formatting on the client, parsing and checking on the server)
//! - The health response served by `api-rest`
//!
//! Used by `api-rest` and `carebook-client` so both sides agree on the header format.

pub mod auth;
pub mod health;

pub use auth::{bearer_header_value, parse_bearer, AuthError};
pub use health::{HealthRes, HealthService};
