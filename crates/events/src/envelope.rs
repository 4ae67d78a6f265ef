use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::NotificationEvent;

/// Envelope for a notification, as it travels over a bus.
///
/// `event_id` lets at-least-once consumers drop duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    event_id: Uuid,
    occurred_at: DateTime<Utc>,
    event: NotificationEvent,
}

impl NotificationEnvelope {
    pub fn new(event: NotificationEvent) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            occurred_at: Utc::now(),
            event,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn event(&self) -> &NotificationEvent {
        &self.event
    }

    pub fn into_event(self) -> NotificationEvent {
        self.event
    }
}
