//! Stock Relay service — configuration, logging, health endpoint, and the
//! wiring that runs the change pipeline next to the HTTP server.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
