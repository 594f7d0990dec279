//! Stock Relay HQ Client — delivers stock change events to the HQ collector.

pub mod hq_client;

pub use hq_client::{HqClient, HqSettings};
