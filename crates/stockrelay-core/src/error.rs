//! Error types for the relay pipeline.

use thiserror::Error;

/// Failure reported by a change source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying connection could not be established or used.
    #[error("change source connection error: {0}")]
    Connection(String),

    /// The source has already been closed.
    #[error("change source is closed")]
    Closed,

    /// The operation needs a subscription that has not been made yet.
    #[error("change source is not subscribed")]
    NotSubscribed,
}

/// The change subscription could not be established.
///
/// This is the only failure that stops the pipeline from starting.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// `LISTEN` on the channel failed.
    #[error("failed to subscribe to channel {channel}: {source}")]
    Subscribe {
        /// The channel that was requested.
        channel: String,
        /// The underlying source failure.
        #[source]
        source: SourceError,
    },

    /// The source did not answer a ping after subscribing.
    #[error("failed to ping change source: {0}")]
    Ping(#[source] SourceError),

    /// A receive loop is already running on this listener.
    #[error("already listening on channel {channel}")]
    AlreadyListening {
        /// The channel the running loop is subscribed to.
        channel: String,
    },
}

/// A single raw payload could not be turned into a stock change event.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid JSON syntax or a field of the wrong type.
    #[error("malformed stock change payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A timestamp field does not match the expected layout.
    #[error("invalid {field} timestamp {value:?}: {source}")]
    BadTimestamp {
        /// Name of the offending field.
        field: &'static str,
        /// The value as received, before trimming.
        value: String,
        /// The parse failure.
        #[source]
        source: chrono::ParseError,
    },
}

/// A single forwarding attempt to HQ failed.
#[derive(Debug, Error)]
pub enum SendError {
    /// The event could not be serialized.
    #[error("failed to encode stock change: {0}")]
    Encode(#[from] serde_json::Error),

    /// DNS, connect, TLS, or I/O failure before a status was received.
    #[error("failed to send request: {0}")]
    Transport(String),

    /// HQ answered with a status of 400 or above.
    #[error("HQ endpoint returned error status: {0}")]
    HttpStatus(u16),
}
