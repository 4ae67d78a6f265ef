//! `userhub-events`: outbound notification events and the bus they travel on.
//!
//! The account workflow only needs a one-way "publish" capability; delivery
//! (email transport, broker) lives behind the bus.

pub mod bus;
pub mod envelope;
pub mod in_memory_bus;
pub mod notification;
pub mod sink;

pub use bus::{EventBus, Subscription};
pub use envelope::NotificationEnvelope;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notification::NotificationEvent;
pub use sink::{NotificationSink, PublishError};
