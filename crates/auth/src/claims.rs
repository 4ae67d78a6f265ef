use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Custom claim carrying the user id as a decimal string.
pub const CLAIM_ID: &str = "id";
/// Custom claim carrying the subject's email.
pub const CLAIM_EMAIL: &str = "email";
/// Custom claim carrying the role name (`USER` / `ADMIN`).
pub const CLAIM_ROLE: &str = "role";

/// Token payload.
///
/// `sub`, `iat` and `exp` are the registered claims; everything the issuer
/// supplied beyond those lands in `custom` (flattened into the payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (the account email).
    pub sub: String,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiration, seconds since the Unix epoch.
    pub exp: i64,

    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

impl TokenClaims {
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.custom.get(name).map(String::as_str)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// `now` is in epoch seconds. A token whose `exp` equals `now` is already
/// expired.
pub fn validate_claims(claims: &TokenClaims, now: i64) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
