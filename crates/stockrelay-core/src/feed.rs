//! Stream of decoded stock changes consumed by the forwarder.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SubscriptionError;
use crate::stock::StockChangeEvent;

/// A cancellable producer of stock change events.
#[async_trait]
pub trait StockChangeFeed: Send + Sync {
    /// Subscribe and return the receiving end of the event stream.
    ///
    /// The stream closes once `cancel` fires or the underlying source is
    /// exhausted.
    async fn listen_for_changes(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StockChangeEvent>, SubscriptionError>;
}
