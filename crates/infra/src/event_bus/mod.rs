//! Broker-backed notification transports.
//!
//! The bus abstraction and the in-process bus live in `userhub-events`. This
//! module adds delivery handlers that forward to out-of-process brokers.

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::{RedisBusError, RedisNotificationPublisher};
