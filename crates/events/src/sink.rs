//! The publish-only capability the account workflow depends on.

use thiserror::Error;

use crate::{EventBus, NotificationEnvelope, NotificationEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification publish failed: {0}")]
pub struct PublishError(pub String);

/// One-way notification outlet.
///
/// Implementations must return promptly; delivery happens elsewhere.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: NotificationEvent) -> Result<(), PublishError>;
}

impl<B> NotificationSink for B
where
    B: EventBus<NotificationEnvelope>,
{
    fn publish(&self, event: NotificationEvent) -> Result<(), PublishError> {
        EventBus::publish(self, NotificationEnvelope::new(event)).map_err(|e| PublishError(format!("{e:?}")))
    }
}
