//! User directory contract.
//!
//! Any storage engine satisfying this trait is substitutable. Single-record
//! operations are expected to be atomic; nothing spans records.

use std::sync::Arc;

use thiserror::Error;

use userhub_auth::Role;
use userhub_core::{DomainError, UserId};

use crate::user::{UserDraft, UserRecord};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Storage-level uniqueness constraint on email.
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// `save` on an id that does not exist.
    #[error("no user with id {0}")]
    Missing(UserId),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DirectoryError> for DomainError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DuplicateEmail(_) => DomainError::email(crate::validation::EMAIL_TAKEN),
            DirectoryError::Missing(id) => DomainError::not_found(format!("User with ID {id} not found.")),
            DirectoryError::Unavailable(msg) => DomainError::internal(msg),
        }
    }
}

pub trait UserDirectory: Send + Sync {
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError>;

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    fn find_by_verification_token(&self, token: &str) -> Result<Option<UserRecord>, DirectoryError>;

    /// Mark the record holding `token` verified and clear the token, in one
    /// atomic step. Returns the updated record, or `None` if no record holds
    /// the token. Of several concurrent calls with one token, at most one
    /// sees `Some`.
    fn consume_verification_token(&self, token: &str) -> Result<Option<UserRecord>, DirectoryError>;

    /// Create a record, assigning a fresh id.
    fn insert(&self, draft: UserDraft) -> Result<UserRecord, DirectoryError>;

    /// Replace an existing record (matched by id).
    fn save(&self, record: UserRecord) -> Result<UserRecord, DirectoryError>;

    fn count_unverified(&self) -> Result<u64, DirectoryError>;

    /// Delete every unverified record, returning how many were removed.
    fn delete_all_unverified(&self) -> Result<u64, DirectoryError>;

    /// All records, ordered by id.
    fn list_all(&self) -> Result<Vec<UserRecord>, DirectoryError>;

    /// Roles held by at least one record.
    fn list_distinct_roles(&self) -> Result<Vec<Role>, DirectoryError>;
}

impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_id(id)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_email(email)
    }

    fn find_by_verification_token(&self, token: &str) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_verification_token(token)
    }

    fn consume_verification_token(&self, token: &str) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).consume_verification_token(token)
    }

    fn insert(&self, draft: UserDraft) -> Result<UserRecord, DirectoryError> {
        (**self).insert(draft)
    }

    fn save(&self, record: UserRecord) -> Result<UserRecord, DirectoryError> {
        (**self).save(record)
    }

    fn count_unverified(&self) -> Result<u64, DirectoryError> {
        (**self).count_unverified()
    }

    fn delete_all_unverified(&self) -> Result<u64, DirectoryError> {
        (**self).delete_all_unverified()
    }

    fn list_all(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        (**self).list_all()
    }

    fn list_distinct_roles(&self) -> Result<Vec<Role>, DirectoryError> {
        (**self).list_distinct_roles()
    }
}
