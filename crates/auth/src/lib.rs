//! `userhub-auth`: authentication/authorization boundary.
//!
//! No HTTP or storage types here: tokens are strings, requests are reduced
//! to an optional `Authorization` header value.

pub mod authorize;
pub mod claims;
pub mod gate;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{Policy, authorize};
pub use claims::{TokenClaims, TokenValidationError, validate_claims};
pub use gate::{AccessGate, extract_bearer};
pub use password::{Argon2PasswordEncoder, PasswordEncoder, PasswordError};
pub use principal::Caller;
pub use roles::Role;
pub use token::{TokenConfig, TokenError, TokenService};
