//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Validation variants carry the caller-facing message verbatim; the transport
/// renders them as-is. `Internal` carries detail for logs only and is never
/// shown to a caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    UserNameInvalid(String),

    #[error("{0}")]
    PasswordInvalid(String),

    #[error("{0}")]
    EmailInvalid(String),

    #[error("{0}")]
    RoleInvalid(String),

    /// Missing user, unknown verification token or empty collection.
    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed or unverifiable bearer token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Valid token, insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Account exists but its email address was never confirmed.
    #[error("Your email is not verified. Check your inbox.")]
    Unverified,

    /// Wrong password or unknown email; the two are deliberately indistinguishable.
    #[error("Password or email invalid.")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn username(msg: impl Into<String>) -> Self {
        Self::UserNameInvalid(msg.into())
    }

    pub fn password(msg: impl Into<String>) -> Self {
        Self::PasswordInvalid(msg.into())
    }

    pub fn email(msg: impl Into<String>) -> Self {
        Self::EmailInvalid(msg.into())
    }

    pub fn role(msg: impl Into<String>) -> Self {
        Self::RoleInvalid(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for caller-input validation failures (rendered as 400).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UserNameInvalid(_) | Self::PasswordInvalid(_) | Self::EmailInvalid(_) | Self::RoleInvalid(_)
        )
    }
}
