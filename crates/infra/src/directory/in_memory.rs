use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use userhub_accounts::{DirectoryError, UserDirectory, UserDraft, UserRecord};
use userhub_auth::Role;
use userhub_core::UserId;

#[derive(Debug, Default)]
struct Tables {
    next_id: u64,
    users: BTreeMap<UserId, UserRecord>,
    /// Unique secondary index; enforced on insert and save.
    by_email: HashMap<String, UserId>,
    by_verification_token: HashMap<String, UserId>,
}

impl Tables {
    fn index(&mut self, user: &UserRecord) {
        self.by_email.insert(user.email.clone(), user.id);
        if let Some(token) = &user.verification_token {
            self.by_verification_token.insert(token.clone(), user.id);
        }
    }

    fn unindex(&mut self, user: &UserRecord) {
        self.by_email.remove(&user.email);
        if let Some(token) = &user.verification_token {
            self.by_verification_token.remove(token);
        }
    }

    fn email_owner(&self, email: &str) -> Option<UserId> {
        self.by_email.get(email).copied()
    }
}

/// In-memory user directory for tests/dev.
///
/// An id-keyed table plus email and verification-token indexes maintained
/// alongside it under one lock, so every single-record operation is atomic.
/// Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<Tables>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DirectoryError> {
        self.inner
            .read()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DirectoryError> {
        self.inner
            .write()
            .map_err(|_| DirectoryError::Unavailable("directory lock poisoned".to_string()))
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let tables = self.read()?;
        Ok(tables.email_owner(email).and_then(|id| tables.users.get(&id).cloned()))
    }

    fn find_by_verification_token(&self, token: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let tables = self.read()?;
        Ok(tables
            .by_verification_token
            .get(token)
            .and_then(|id| tables.users.get(id).cloned()))
    }

    fn consume_verification_token(&self, token: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let mut tables = self.write()?;
        let Some(id) = tables.by_verification_token.remove(token) else {
            return Ok(None);
        };
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };

        user.verified = true;
        user.verification_token = None;
        Ok(Some(user.clone()))
    }

    fn insert(&self, draft: UserDraft) -> Result<UserRecord, DirectoryError> {
        let mut tables = self.write()?;
        if tables.email_owner(&draft.email).is_some() {
            return Err(DirectoryError::DuplicateEmail(draft.email));
        }

        tables.next_id += 1;
        let user = draft.into_record(UserId::new(tables.next_id));
        tables.index(&user);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn save(&self, record: UserRecord) -> Result<UserRecord, DirectoryError> {
        let mut tables = self.write()?;
        let Some(previous) = tables.users.get(&record.id).cloned() else {
            return Err(DirectoryError::Missing(record.id));
        };
        if tables.email_owner(&record.email).is_some_and(|owner| owner != record.id) {
            return Err(DirectoryError::DuplicateEmail(record.email));
        }

        tables.unindex(&previous);
        tables.index(&record);
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    fn count_unverified(&self) -> Result<u64, DirectoryError> {
        Ok(self.read()?.users.values().filter(|u| !u.verified).count() as u64)
    }

    fn delete_all_unverified(&self) -> Result<u64, DirectoryError> {
        let mut tables = self.write()?;
        let doomed: Vec<UserRecord> = tables.users.values().filter(|u| !u.verified).cloned().collect();

        for user in &doomed {
            tables.unindex(user);
            tables.users.remove(&user.id);
        }
        Ok(doomed.len() as u64)
    }

    fn list_all(&self) -> Result<Vec<UserRecord>, DirectoryError> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    fn list_distinct_roles(&self) -> Result<Vec<Role>, DirectoryError> {
        let roles: BTreeSet<Role> = self.read()?.users.values().map(|u| u.role).collect();
        Ok(roles.into_iter().collect())
    }
}
