//! Change source abstraction.
//!
//! In production this wraps a PostgreSQL `LISTEN` connection. In tests, an
//! in-memory implementation is injected.

use async_trait::async_trait;

use crate::error::SourceError;

/// Channel name the branch database publishes stock changes on.
pub const STOCK_CHANGES_CHANNEL: &str = "stock_changes";

/// One notification body as delivered by a change source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChangePayload {
    channel: String,
    body: String,
}

impl RawChangePayload {
    /// Creates a payload received on `channel`.
    #[must_use]
    pub fn new(channel: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            body: body.into(),
        }
    }

    /// A payload with no body, delivered when the source has nothing to say
    /// (for example after a dropped connection).
    #[must_use]
    pub fn empty(channel: impl Into<String>) -> Self {
        Self::new(channel, String::new())
    }

    /// The channel the payload arrived on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns `true` for heartbeat payloads: blank bodies and the literal
    /// `null`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let body = self.body.trim();
        body.is_empty() || body == "null"
    }
}

/// Publish/subscribe capability the change listener reads from.
#[async_trait]
pub trait ChangeSource: Send {
    /// Start receiving notifications published on `channel`.
    async fn subscribe(&mut self, channel: &str) -> Result<(), SourceError>;

    /// Verify the source is reachable.
    async fn ping(&mut self) -> Result<(), SourceError>;

    /// Release the subscription and the underlying connection.
    async fn close(&mut self) -> Result<(), SourceError>;

    /// Wait for the next payload. `None` means the source is closed or
    /// exhausted and will deliver nothing further.
    async fn recv(&mut self) -> Option<RawChangePayload>;
}
