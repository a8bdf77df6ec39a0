//! Fan-out of per-cycle transaction batches
//!
//! - `hub`: subscriber registry and the delivery pass run once per cycle

pub mod hub;
pub use hub::{BroadcastHub, DeliveryPolicy, DeliveryReport, SharedBatch, Subscription};
