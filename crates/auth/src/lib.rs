//! `sweetshop-auth`: pure authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage. The only way to obtain a
//! [`Grant`] is [`authorize`], so any operation that demands a grant has had
//! its permission checked before it runs.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{authorize, AuthzError, Grant};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{issue_token, Hs256JwtValidator, JwtError, JwtValidator};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use sweetshop_core::PrincipalId;
