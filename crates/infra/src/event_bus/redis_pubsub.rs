//! Redis pub/sub notification delivery (optional).
//!
//! Each notification is published as JSON on the channel named by its routing
//! key (`welcome.email`, `verification.email`), so an external mail service can
//! subscribe to just the kinds it handles. Pub/sub is not durable: messages
//! published while no subscriber is connected are lost.
//!
//! The publisher runs as a [`NotificationWorker`](crate::NotificationWorker)
//! handler, never on a request path.

use std::time::Duration;

use redis::Commands;
use thiserror::Error;
use tracing::debug;

use userhub_events::NotificationEnvelope;

/// Bound on connect, read and write for each broker round trip.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum RedisBusError {
    #[error("redis: {0}")]
    Redis(String),
    #[error("serialize: {0}")]
    Serialize(String),
}

impl From<redis::RedisError> for RedisBusError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err.to_string())
    }
}

/// Channel and JSON payload for one envelope.
pub fn encode(envelope: &NotificationEnvelope) -> Result<(&'static str, String), RedisBusError> {
    let payload = serde_json::to_string(envelope).map_err(|e| RedisBusError::Serialize(e.to_string()))?;
    Ok((envelope.event().routing_key(), payload))
}

/// Publishes envelopes over one kept connection, reconnecting after a failure.
pub struct RedisNotificationPublisher {
    client: redis::Client,
    conn: Option<redis::Connection>,
    io_timeout: Duration,
}

impl RedisNotificationPublisher {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, RedisBusError> {
        Ok(Self {
            client: redis::Client::open(redis_url.as_ref())?,
            conn: None,
            io_timeout: DEFAULT_IO_TIMEOUT,
        })
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn deliver(&mut self, envelope: &NotificationEnvelope) -> Result<(), RedisBusError> {
        let (channel, payload) = encode(envelope)?;

        // A failed round trip drops the connection; the next delivery reconnects.
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        let receivers: i64 = conn.publish(channel, payload)?;
        self.conn = Some(conn);

        debug!(channel, receivers, event_id = %envelope.event_id(), "notification published");
        Ok(())
    }

    fn connect(&self) -> Result<redis::Connection, RedisBusError> {
        let conn = self.client.get_connection_with_timeout(self.io_timeout)?;
        conn.set_read_timeout(Some(self.io_timeout))?;
        conn.set_write_timeout(Some(self.io_timeout))?;
        Ok(conn)
    }
}

impl core::fmt::Debug for RedisNotificationPublisher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RedisNotificationPublisher")
            .field("connected", &self.conn.is_some())
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}
