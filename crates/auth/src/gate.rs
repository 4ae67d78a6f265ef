//! Access control gate: bearer token → caller identity and role.

use std::sync::Arc;

use userhub_core::{DomainError, DomainResult, UserId};

use crate::{Caller, Role, TokenService};

/// Derives the caller from a request's `Authorization` header value.
///
/// Every failure (missing header, wrong scheme, unverifiable token, missing
/// claim) collapses into `DomainError::Unauthenticated`.
#[derive(Clone)]
pub struct AccessGate {
    tokens: Arc<TokenService>,
}

impl AccessGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    pub fn caller(&self, authorization: Option<&str>) -> DomainResult<Caller> {
        let token = bearer(authorization)?;
        let id = self.tokens.extract_id(token).map_err(|_| DomainError::Unauthenticated)?;
        let role = self.tokens.extract_role(token).map_err(|_| DomainError::Unauthenticated)?;
        Ok(Caller::new(id, role))
    }

    pub fn current_user_id(&self, authorization: Option<&str>) -> DomainResult<UserId> {
        let token = bearer(authorization)?;
        self.tokens.extract_id(token).map_err(|_| DomainError::Unauthenticated)
    }

    pub fn current_user_role(&self, authorization: Option<&str>) -> DomainResult<Role> {
        let token = bearer(authorization)?;
        self.tokens.extract_role(token).map_err(|_| DomainError::Unauthenticated)
    }
}

fn bearer(authorization: Option<&str>) -> DomainResult<&str> {
    authorization
        .and_then(extract_bearer)
        .ok_or(DomainError::Unauthenticated)
}

/// Strip the `Bearer ` scheme; `None` for any other shape or an empty token.
pub fn extract_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
