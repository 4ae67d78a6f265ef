//! Compact signed tokens (HS256 JWT) carrying identity and role claims.
//!
//! The service is a pure function of its immutable key, its TTL and the wall
//! clock. It is built once at startup and shared behind an `Arc`.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use tracing::debug;

use userhub_core::UserId;

use crate::Role;
use crate::claims::{CLAIM_EMAIL, CLAIM_ID, CLAIM_ROLE, TokenClaims, validate_claims};

/// Minimum HMAC key size (256 bits) for HS256.
pub const MIN_KEY_BYTES: usize = 32;

/// Longest accepted token lifetime.
pub const MAX_TTL_DAYS: i64 = 365;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Structure, signature, expiry or claim failure. The causes are not
    /// distinguished to callers.
    #[error("invalid token")]
    InvalidToken,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token configuration invalid: {0}")]
    Config(String),
}

/// Immutable signing configuration, loaded once at startup.
#[derive(Clone)]
pub struct TokenConfig {
    key: Vec<u8>,
    ttl: Duration,
}

impl TokenConfig {
    pub fn new(key: Vec<u8>, ttl: Duration) -> Result<Self, TokenError> {
        if key.len() < MIN_KEY_BYTES {
            return Err(TokenError::Config(format!(
                "signing key must be at least {MIN_KEY_BYTES} bytes, got {}",
                key.len()
            )));
        }
        if ttl < Duration::seconds(1) {
            return Err(TokenError::Config("token ttl must be at least one second".to_string()));
        }
        if ttl > Duration::days(MAX_TTL_DAYS) {
            return Err(TokenError::Config(format!("token ttl must be at most {MAX_TTL_DAYS} days")));
        }
        Ok(Self { key, ttl })
    }

    /// Decode a base64 (standard alphabet) secret.
    pub fn from_base64(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        let key = STANDARD
            .decode(secret.trim())
            .map_err(|e| TokenError::Config(format!("secret is not valid base64: {e}")))?;
        Self::new(key, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding: EncodingKey::from_secret(&config.key),
            decoding: DecodingKey::from_secret(&config.key),
            validation,
            ttl: config.ttl,
        }
    }

    /// Issue a token for `subject` with the supplied custom claims.
    pub fn issue(&self, subject: &str, claims: BTreeMap<String, String>) -> Result<String, TokenError> {
        self.issue_at(subject, claims, Utc::now())
    }

    /// Issue with an explicit issue instant (`exp = now + ttl`).
    pub fn issue_at(
        &self,
        subject: &str,
        claims: BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
            custom: claims,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue the standard login token: `{id, email, role}` on top of `sub`.
    pub fn issue_for_user(&self, subject: &str, id: UserId, role: Role) -> Result<String, TokenError> {
        self.issue(subject, user_claims(subject, id, role))
    }

    /// Verify signature and time window against the current clock.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, then the time window against `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!(error = %e, "token rejected by decoder");
            TokenError::InvalidToken
        })?;

        validate_claims(&data.claims, now.timestamp()).map_err(|e| {
            debug!(error = %e, "token rejected by claim window");
            TokenError::InvalidToken
        })?;

        Ok(data.claims)
    }

    pub fn extract_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.verify(token)?.sub)
    }

    pub fn extract_id(&self, token: &str) -> Result<UserId, TokenError> {
        let claims = self.verify(token)?;
        claims
            .claim(CLAIM_ID)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(UserId::new)
            .ok_or(TokenError::InvalidToken)
    }

    pub fn extract_role(&self, token: &str) -> Result<Role, TokenError> {
        let claims = self.verify(token)?;
        claims
            .claim(CLAIM_ROLE)
            .and_then(|raw| raw.parse::<Role>().ok())
            .ok_or(TokenError::InvalidToken)
    }

    /// True iff the token verifies, is unexpired and its subject equals
    /// `expected_username` exactly (case-sensitive).
    pub fn is_valid_for(&self, token: &str, expected_username: &str) -> bool {
        self.verify(token)
            .map(|claims| claims.sub == expected_username)
            .unwrap_or(false)
    }
}

fn user_claims(subject: &str, id: UserId, role: Role) -> BTreeMap<String, String> {
    BTreeMap::from([
        (CLAIM_ID.to_string(), id.to_string()),
        (CLAIM_EMAIL.to_string(), subject.to_string()),
        (CLAIM_ROLE.to_string(), role.as_str().to_string()),
    ])
}
