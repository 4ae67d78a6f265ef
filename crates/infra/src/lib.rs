//! Infrastructure layer: directory storage, notification delivery, brokers.

pub mod directory;
pub mod event_bus;
pub mod workers;


pub use directory::InMemoryUserDirectory;
pub use workers::notification_worker::{NotificationWorker, WorkerHandle};
