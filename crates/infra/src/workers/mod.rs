//! Background workers.

pub mod notification_worker;
