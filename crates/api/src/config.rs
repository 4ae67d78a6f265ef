//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};

use userhub_accounts::PasswordPolicy;
use userhub_auth::TokenConfig;

/// Insecure signing key used when `JWT_SECRET` is unset. Dev only.
const DEV_JWT_SECRET: &str = "dXNlcmh1Yi1kZXYtc2lnbmluZy1rZXktY2hhbmdlLW1lLWluLXByb2Qh";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_JWT_EXPIRATION_MS: i64 = 3_600_000;

/// Argon2 work factors. Defaults follow the argon2 crate's recommended
/// parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub token: TokenConfig,
    pub password_policy: PasswordPolicy,
    pub hash_cost: HashCost,
    pub seed_demo_users: bool,
    pub purge_interval: Option<Duration>,
    pub redis_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });
        let ttl_ms: i64 = parse_or(get("JWT_EXPIRATION_MS"), "JWT_EXPIRATION_MS", DEFAULT_JWT_EXPIRATION_MS)?;
        let ttl = chrono::Duration::try_milliseconds(ttl_ms).context("JWT_EXPIRATION_MS is out of range")?;
        let token = TokenConfig::from_base64(&secret, ttl).context("invalid JWT_SECRET / JWT_EXPIRATION_MS")?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let defaults = PasswordPolicy::default();
        let min_length = parse_or(get("PASSWORD_MIN_LENGTH"), "PASSWORD_MIN_LENGTH", defaults.min_length)?;
        if min_length == 0 {
            bail!("PASSWORD_MIN_LENGTH must be positive");
        }

        let cost = HashCost::default();
        let hash_cost = HashCost {
            memory_kib: parse_or(get("ARGON2_MEMORY_KIB"), "ARGON2_MEMORY_KIB", cost.memory_kib)?,
            iterations: parse_or(get("ARGON2_ITERATIONS"), "ARGON2_ITERATIONS", cost.iterations)?,
            parallelism: cost.parallelism,
        };

        let purge_secs: u64 = parse_or(get("PURGE_INTERVAL_SECS"), "PURGE_INTERVAL_SECS", 0)?;

        Ok(Self {
            bind_addr,
            token,
            password_policy: PasswordPolicy::with_min_length(min_length),
            hash_cost,
            seed_demo_users: parse_or(get("SEED_DEMO_USERS"), "SEED_DEMO_USERS", false)?,
            purge_interval: (purge_secs > 0).then(|| Duration::from_secs(purge_secs)),
            redis_url: get("REDIS_URL"),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw.trim().parse().with_context(|| format!("{key} is invalid: {raw:?}")),
        None => Ok(default),
    }
}
