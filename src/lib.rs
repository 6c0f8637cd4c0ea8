// src/lib.rs

pub mod claims;
pub mod client;
pub mod config;
pub mod error;
mod jwk;
#[cfg(feature = "axum-integration")]
pub mod middleware;
pub mod model;
pub mod validator;

/// The public prelude for the `alder-oidc` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::claims::{ClaimValue, Claims};
    pub use crate::config::{Config, ConfigBuilder};
    pub use crate::error::AlderOidcError;
    #[cfg(feature = "axum-integration")]
    pub use crate::middleware::{insert_claims, require_auth, AuthState, ClaimsExt};
    pub use crate::validator::Validator;
    pub use jsonwebtoken::Algorithm;
}
