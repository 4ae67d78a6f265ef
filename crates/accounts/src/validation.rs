//! Validation pipeline for state-changing account operations.
//!
//! Every rule is a pure predicate over primitive input (plus a directory read
//! for email uniqueness). Workflows compose them; the composition order fixes
//! which message the caller sees first.

use std::sync::LazyLock;

use regex::Regex;

use userhub_auth::{PasswordEncoder, Role};
use userhub_core::{DomainError, DomainResult};

use crate::directory::UserDirectory;
use crate::user::NewUser;

pub(crate) const EMAIL_TAKEN: &str = "This email is already registered.";

/// Relaxed shape check: `local@domain.tld`, no whitespace. Length is checked
/// separately. Not RFC 5322.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

const EMAIL_MIN_LENGTH: usize = 8;

/// Password strength rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// Characters that satisfy the "special character" clause.
    pub special_characters: String,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            special_characters: "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~".to_string(),
        }
    }
}

impl PasswordPolicy {
    pub fn with_min_length(min_length: usize) -> Self {
        Self {
            min_length,
            ..Self::default()
        }
    }

    /// Length, one digit, one lower, one upper, one special, no whitespace.
    pub fn accepts(&self, password: &str) -> bool {
        password.chars().count() >= self.min_length
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| self.special_characters.contains(c))
            && !password.chars().any(char::is_whitespace)
    }

    fn violation_message(&self) -> String {
        format!(
            "Password must have at least: one digit, a lower and upper case letter, a special character, {} characters and no whitespace.",
            self.min_length
        )
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// `Some(value)` when present and not whitespace-only.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    if is_blank(value) { None } else { value }
}

pub fn validate_username(username: Option<&str>) -> DomainResult<()> {
    if is_blank(username) {
        return Err(DomainError::username("Username cannot be null or blank."));
    }
    Ok(())
}

pub fn validate_password(password: Option<&str>, policy: &PasswordPolicy) -> DomainResult<()> {
    let Some(password) = non_blank(password) else {
        return Err(DomainError::password("Password cannot be null or blank."));
    };
    if !policy.accepts(password) {
        return Err(DomainError::password(policy.violation_message()));
    }
    Ok(())
}

pub fn validate_email(email: Option<&str>) -> DomainResult<()> {
    let Some(email) = non_blank(email) else {
        return Err(DomainError::email("Email cannot be null or blank."));
    };
    if email.chars().count() < EMAIL_MIN_LENGTH || !EMAIL_PATTERN.is_match(email) {
        return Err(DomainError::email(
            "Invalid email format: must have at least 8 characters and a '@'.",
        ));
    }
    Ok(())
}

pub fn validate_email_unique(email: &str, directory: &dyn UserDirectory) -> DomainResult<()> {
    if directory.find_by_email(email)?.is_some() {
        return Err(DomainError::email(EMAIL_TAKEN));
    }
    Ok(())
}

/// Exactly `USER` or `ADMIN`; resolves the raw string to a [`Role`].
pub fn validate_role(role: Option<&str>) -> DomainResult<Role> {
    role.and_then(|r| r.parse::<Role>().ok())
        .ok_or_else(|| DomainError::role("Role must be ADMIN or USER."))
}

/// Exactly `true` or `false`.
pub fn validate_verified_flag(flag: &str) -> DomainResult<bool> {
    match flag {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DomainError::role("Verified must be true or false.")),
    }
}

/// The new password must not match the currently stored hash.
pub fn validate_distinct_password(
    candidate: &str,
    stored_hash: &str,
    encoder: &dyn PasswordEncoder,
) -> DomainResult<()> {
    if encoder.matches(candidate, stored_hash) {
        return Err(DomainError::password("New password must be different to the old one."));
    }
    Ok(())
}

/// An update request must change something.
pub fn validate_at_least_one_field(username: Option<&str>, password: Option<&str>) -> DomainResult<()> {
    if is_blank(username) && is_blank(password) {
        return Err(DomainError::username("At least one value has to be modified."));
    }
    Ok(())
}

/// Full registration check: username → password → email format → email
/// uniqueness → role. Returns the resolved role.
pub fn validate_new_user(
    new_user: &NewUser,
    directory: &dyn UserDirectory,
    policy: &PasswordPolicy,
) -> DomainResult<Role> {
    validate_username(new_user.username.as_deref())?;
    validate_password(new_user.password.as_deref(), policy)?;
    validate_email(new_user.email.as_deref())?;
    validate_email_unique(new_user.email.as_deref().unwrap_or_default(), directory)?;
    validate_role(new_user.role.as_deref())
}
