//! Stock Relay Core — shared domain types and ports.
//!
//! This crate defines the stock change event, its wire format, the error
//! taxonomy, and the traits that the listener, forwarder, and HQ client
//! meet at. It contains no infrastructure code.

pub mod error;
pub mod feed;
pub mod sink;
pub mod source;
pub mod stock;
