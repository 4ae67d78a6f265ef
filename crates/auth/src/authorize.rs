//! Endpoint authorization policy.

use tracing::debug;

use userhub_core::{DomainError, DomainResult};

use crate::Caller;

/// What an operation requires of its caller beyond a verified token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Any authenticated caller; the operation scopes itself to the caller's id.
    Authenticated,
    /// Caller role must be `ADMIN`.
    AdminOnly,
}

/// Authorize a caller against a policy.
///
/// - No IO
/// - Runs before any directory read, so a denial never reveals whether the
///   target exists
pub fn authorize(caller: &Caller, policy: Policy) -> DomainResult<()> {
    match policy {
        Policy::Authenticated => Ok(()),
        Policy::AdminOnly if caller.role().is_admin() => Ok(()),
        Policy::AdminOnly => {
            debug!(user_id = %caller.id(), role = %caller.role(), "admin-only operation denied");
            Err(DomainError::Forbidden)
        }
    }
}
