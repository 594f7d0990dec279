//! Downstream delivery abstraction.

use async_trait::async_trait;

use crate::error::SendError;
use crate::stock::StockChangeEvent;

/// Delivers one stock change event downstream. One attempt per call.
#[async_trait]
pub trait StockSink: Send + Sync {
    /// Send `event`, returning once the downstream has answered.
    async fn send(&self, event: &StockChangeEvent) -> Result<(), SendError>;
}
