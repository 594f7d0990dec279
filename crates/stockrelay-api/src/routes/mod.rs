//! HTTP route modules.

pub mod health;
