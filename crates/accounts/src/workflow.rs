//! Account workflows.
//!
//! Each operation validates, then touches the directory, then (optionally)
//! publishes a notification. Publishing is fire-and-forget: a failed publish is
//! logged and never undoes the directory write that preceded it.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use userhub_auth::{Caller, PasswordEncoder, Policy, Role, TokenService, authorize};
use userhub_core::{DomainError, DomainResult, UserId};
use userhub_events::{NotificationEvent, NotificationSink};

use crate::directory::UserDirectory;
use crate::user::{NewUser, UpdateUser, UpdateUserRole, UserDetailView, UserDraft, UserRecord, UserView};
use crate::validation::{self, PasswordPolicy, non_blank};

/// Checked against on a login miss so an unknown email costs one hash
/// verification, the same as a wrong password.
const DUMMY_PASSWORD: &str = "userhub-no-such-account";

pub struct UserWorkflow {
    directory: Arc<dyn UserDirectory>,
    encoder: Arc<dyn PasswordEncoder>,
    tokens: Arc<TokenService>,
    notifications: Arc<dyn NotificationSink>,
    policy: PasswordPolicy,
    dummy_hash: String,
}

impl UserWorkflow {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        encoder: Arc<dyn PasswordEncoder>,
        tokens: Arc<TokenService>,
        notifications: Arc<dyn NotificationSink>,
        policy: PasswordPolicy,
    ) -> Self {
        let dummy_hash = encoder.encode(DUMMY_PASSWORD).unwrap_or_else(|err| {
            warn!(error = %err, "could not precompute the login miss hash");
            String::new()
        });

        Self {
            directory,
            encoder,
            tokens,
            notifications,
            policy,
            dummy_hash,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Public (unauthenticated) flows
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an unverified account and request a verification email.
    ///
    /// Fails with the first validation error; nothing is written unless the
    /// whole record is.
    pub fn register(&self, new_user: &NewUser) -> DomainResult<UserRecord> {
        let role = validation::validate_new_user(new_user, self.directory.as_ref(), &self.policy)?;

        let email = new_user.email.clone().unwrap_or_default();
        let draft = UserDraft {
            email: email.clone(),
            username: new_user.username.clone().unwrap_or_default(),
            password_hash: self.hash(new_user.password.as_deref().unwrap_or_default())?,
            role,
            verified: false,
            verification_token: Some(new_verification_token()),
        };

        let user = self.directory.insert(draft)?;
        info!(user_id = %user.id, role = %user.role, "user registered");

        if let Some(token) = &user.verification_token {
            self.notify(NotificationEvent::verification(email, token.clone()));
        }

        Ok(user)
    }

    /// Check credentials and issue an access token.
    ///
    /// Unknown email and wrong password are both `InvalidCredentials`, and
    /// both run exactly one hash verification.
    pub fn login(&self, email: &str, password: &str) -> DomainResult<String> {
        let Some(user) = self.directory.find_by_email(email)? else {
            self.encoder.matches(password, &self.dummy_hash);
            return Err(DomainError::InvalidCredentials);
        };
        if !self.encoder.matches(password, &user.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }

        if !user.verified {
            debug!(user_id = %user.id, "login refused for unverified account");
            return Err(DomainError::Unverified);
        }

        self.tokens
            .issue_for_user(&user.email, user.id, user.role)
            .map_err(|e| internal("token issuance failed", e))
    }

    /// Consume a verification token. Single use: a second call with the same
    /// token fails `NotFound`, even when the two race.
    pub fn verify_email(&self, token: &str) -> DomainResult<UserView> {
        let user = self
            .directory
            .consume_verification_token(token)?
            .ok_or_else(|| DomainError::not_found("Invalid or expired token."))?;
        info!(user_id = %user.id, "email verified");

        self.notify(NotificationEvent::welcome(user.email.clone()));
        Ok(UserView::from(&user))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Self-service (scoped to the caller's own id)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_own_profile(&self, caller: &Caller) -> DomainResult<UserView> {
        authorize(caller, Policy::Authenticated)?;
        Ok(UserView::from(&self.load(caller.id())?))
    }

    /// Partial update of username and/or password.
    pub fn update_profile(&self, caller: &Caller, update: &UpdateUser) -> DomainResult<UserView> {
        authorize(caller, Policy::Authenticated)?;
        let mut user = self.load(caller.id())?;

        let username = update.username.as_deref();
        let password = update.password.as_deref();
        validation::validate_at_least_one_field(username, password)?;

        if let Some(username) = non_blank(username) {
            user.username = username.to_string();
        }

        if let Some(password) = non_blank(password) {
            validation::validate_distinct_password(password, &user.password_hash, self.encoder.as_ref())?;
            validation::validate_password(Some(password), &self.policy)?;
            user.password_hash = self.hash(password)?;
        }

        let user = self.directory.save(user)?;
        info!(user_id = %user.id, "profile updated");
        Ok(UserView::from(&user))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin-only
    // ─────────────────────────────────────────────────────────────────────────

    /// Register on someone else's behalf.
    pub fn create_user(&self, caller: &Caller, new_user: &NewUser) -> DomainResult<UserRecord> {
        authorize(caller, Policy::AdminOnly)?;
        self.register(new_user)
    }

    /// Change role and/or verified flag; blank fields are left unchanged.
    pub fn admin_update_role_or_verified(
        &self,
        caller: &Caller,
        target: UserId,
        update: &UpdateUserRole,
    ) -> DomainResult<UserView> {
        authorize(caller, Policy::AdminOnly)?;
        let mut user = self.load(target)?;

        if let Some(role) = non_blank(update.role.as_deref()) {
            user.role = validation::validate_role(Some(role))?;
        }

        if let Some(flag) = non_blank(update.verified.as_deref()) {
            user.verified = validation::validate_verified_flag(flag)?;
            if user.verified {
                user.verification_token = None;
            }
        }

        let user = self.directory.save(user)?;
        info!(
            user_id = %user.id,
            actor = %caller.id(),
            role = %user.role,
            verified = user.verified,
            "user role/verification updated"
        );
        Ok(UserView::from(&user))
    }

    /// Every user; an empty directory is reported as `NotFound`.
    pub fn list_all(&self, caller: &Caller) -> DomainResult<Vec<UserDetailView>> {
        authorize(caller, Policy::AdminOnly)?;
        let users: Vec<UserDetailView> = self.directory.list_all()?.iter().map(UserDetailView::from).collect();
        if users.is_empty() {
            return Err(DomainError::not_found("There are no registered users."));
        }
        Ok(users)
    }

    pub fn get_by_id(&self, caller: &Caller, id: UserId) -> DomainResult<UserView> {
        authorize(caller, Policy::AdminOnly)?;
        Ok(UserView::from(&self.load(id)?))
    }

    pub fn get_email_by_id(&self, caller: &Caller, id: UserId) -> DomainResult<String> {
        authorize(caller, Policy::AdminOnly)?;
        Ok(self.load(id)?.email)
    }

    pub fn list_roles(&self, caller: &Caller) -> DomainResult<Vec<Role>> {
        authorize(caller, Policy::AdminOnly)?;
        Ok(self.directory.list_distinct_roles()?)
    }

    /// Irreversibly delete every unverified account.
    pub fn purge_unverified(&self, caller: &Caller) -> DomainResult<u64> {
        authorize(caller, Policy::AdminOnly)?;
        self.purge()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // System (no caller): bootstrap and scheduled jobs
    // ─────────────────────────────────────────────────────────────────────────

    /// Scheduled purge; an empty result is not an error here.
    pub fn scheduled_purge(&self) -> DomainResult<u64> {
        match self.purge() {
            Err(DomainError::NotFound(_)) => Ok(0),
            other => other,
        }
    }

    /// Seed/import path: same validation as registration, optionally
    /// pre-verified, never issues a verification token or a notification.
    pub fn import_user(&self, new_user: &NewUser, verified: bool) -> DomainResult<UserRecord> {
        let role = validation::validate_new_user(new_user, self.directory.as_ref(), &self.policy)?;

        let draft = UserDraft {
            email: new_user.email.clone().unwrap_or_default(),
            username: new_user.username.clone().unwrap_or_default(),
            password_hash: self.hash(new_user.password.as_deref().unwrap_or_default())?,
            role,
            verified,
            verification_token: None,
        };

        let user = self.directory.insert(draft)?;
        debug!(user_id = %user.id, verified, "user imported");
        Ok(user)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn purge(&self) -> DomainResult<u64> {
        if self.directory.count_unverified()? == 0 {
            return Err(DomainError::not_found("There are no unverified users."));
        }
        let removed = self.directory.delete_all_unverified()?;
        info!(removed, "unverified users purged");
        Ok(removed)
    }

    fn load(&self, id: UserId) -> DomainResult<UserRecord> {
        self.directory
            .find_by_id(id)?
            .ok_or_else(|| DomainError::not_found(format!("User with ID {id} not found.")))
    }

    fn hash(&self, raw: &str) -> DomainResult<String> {
        self.encoder
            .encode(raw)
            .map_err(|e| internal("password hashing failed", e))
    }

    fn notify(&self, event: NotificationEvent) {
        let routing_key = event.routing_key();
        if let Err(err) = self.notifications.publish(event) {
            warn!(routing_key, error = %err, "notification publish failed");
        }
    }
}

/// Log the detail, keep it out of anything a caller could see.
fn internal(what: &'static str, err: impl core::fmt::Display) -> DomainError {
    error!(error = %err, "{what}");
    DomainError::internal(format!("{what}: {err}"))
}

/// Opaque single-use email verification token (random UUIDv4).
fn new_verification_token() -> String {
    Uuid::new_v4().to_string()
}
