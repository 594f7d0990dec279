//! Stock Relay Forwarding — drains the stock change stream into HQ.

pub mod forwarding_service;

pub use forwarding_service::{ForwardingError, ForwardingService};
