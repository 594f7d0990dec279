//! Stock Relay — service error types.

use stockrelay_forwarding::ForwardingError;
use thiserror::Error;

/// Startup and runtime errors for the relay service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The log directory or subscriber could not be set up.
    #[error("logging error: {0}")]
    Logging(String),

    /// The change pipeline could not subscribe to the branch database.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] ForwardingError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}
