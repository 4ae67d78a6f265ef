//! User record and its request/response shapes.

use serde::{Deserialize, Serialize};

use userhub_auth::Role;
use userhub_core::UserId;

/// Stored user record (owned by the directory).
///
/// # Invariants
/// - `email` is unique across all records.
/// - `password_hash` is encoder output, never plaintext.
/// - `verification_token` is `Some` only while the address is unconfirmed
///   since the token was issued; it is cleared together with `verified = true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub verification_token: Option<String>,
}

/// A record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub verified: bool,
    pub verification_token: Option<String>,
}

impl UserDraft {
    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            role: self.role,
            verified: self.verified,
            verification_token: self.verification_token,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Registration / admin-creation request. Absent fields deserialize to `None`
/// and are reported by validation like blank ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl NewUser {
    pub fn new(email: &str, username: &str, password: &str, role: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            role: Some(role.to_string()),
        }
    }
}

/// Self-service profile update; blank or absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Admin mutation of role and/or verified flag (`"true"` / `"false"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUserRole {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub verified: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Projections (non-sensitive)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<&UserRecord> for UserView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Admin listing projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetailView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub verified: bool,
}

impl From<&UserRecord> for UserDetailView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            verified: user.verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projections_never_carry_credentials() {
        let record = UserDraft {
            email: "a@bcdefgh.com".to_string(),
            username: "A".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::User,
            verified: false,
            verification_token: Some("tok".to_string()),
        }
        .into_record(UserId::new(3));

        let json = serde_json::to_string(&UserDetailView::from(&record)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("tok"));

        let view = UserView::from(&record);
        assert_eq!(view.id, UserId::new(3));
        assert_eq!(view.email, "a@bcdefgh.com");
    }

    #[test]
    fn missing_request_fields_deserialize_to_none() {
        let req: NewUser = serde_json::from_str(r#"{"email":"a@bcdefgh.com"}"#).unwrap();
        assert_eq!(req.email.as_deref(), Some("a@bcdefgh.com"));
        assert!(req.username.is_none());

        let upd: UpdateUserRole = serde_json::from_str(r#"{"verified":"true"}"#).unwrap();
        assert!(upd.role.is_none());
        assert_eq!(upd.verified.as_deref(), Some("true"));
    }
}
