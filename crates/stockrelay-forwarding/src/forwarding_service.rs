//! Forwarding service: consumes stock changes one at a time and sends each
//! to HQ.
//!
//! Delivery is at-most-once. A failed send is logged and the event is
//! dropped; nothing is retried or queued.

use std::sync::Arc;

use stockrelay_core::error::SubscriptionError;
use stockrelay_core::feed::StockChangeFeed;
use stockrelay_core::sink::StockSink;
use stockrelay_core::stock::StockChangeEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Failure that prevents the forwarding loop from running.
#[derive(Debug, Error)]
pub enum ForwardingError {
    /// The change stream could not be opened.
    #[error("failed to start listening: {0}")]
    Listen(#[from] SubscriptionError),
}

/// Drains a [`StockChangeFeed`] into a [`StockSink`].
#[derive(Clone)]
pub struct ForwardingService {
    feed: Arc<dyn StockChangeFeed>,
    sink: Arc<dyn StockSink>,
}

impl ForwardingService {
    /// Creates a new `ForwardingService`.
    #[must_use]
    pub fn new(feed: Arc<dyn StockChangeFeed>, sink: Arc<dyn StockSink>) -> Self {
        Self { feed, sink }
    }

    /// Opens the change stream.
    ///
    /// Startup code calls this before serving so a failed subscription
    /// stops the process instead of leaving it running without a pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ForwardingError::Listen` if the stream cannot be opened.
    pub async fn listen(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StockChangeEvent>, ForwardingError> {
        info!("Starting stock change forwarding");

        let events = self
            .feed
            .listen_for_changes(cancel)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to start listening for changes"))?;

        info!("Successfully started listening for stock changes");
        Ok(events)
    }

    /// Sends every event from `events` until the stream closes.
    ///
    /// Each event is sent and its outcome awaited before the next one is
    /// taken, so the stream's backpressure is the only flow control.
    /// Individual send failures are logged and never returned.
    pub async fn forward(&self, mut events: mpsc::Receiver<StockChangeEvent>) {
        let mut sent: u64 = 0;
        let mut failed: u64 = 0;
        while let Some(event) = events.recv().await {
            info!(
                product_id = event.product_id,
                branch_id = event.branch_id,
                "Processing stock change notification"
            );

            match self.sink.send(&event).await {
                Ok(()) => {
                    sent += 1;
                    info!(
                        product_id = event.product_id,
                        branch_id = event.branch_id,
                        "Successfully sent stock change to HQ"
                    );
                }
                Err(e) => {
                    failed += 1;
                    error!(
                        error = %e,
                        product_id = event.product_id,
                        branch_id = event.branch_id,
                        "Failed to send stock change to HQ"
                    );
                }
            }
        }

        info!(sent, failed, "Stopped listening for stock changes");
    }

    /// Opens the change stream and forwards it until it closes.
    ///
    /// # Errors
    ///
    /// Returns `ForwardingError::Listen` if the stream cannot be opened.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ForwardingError> {
        let events = self.listen(cancel).await?;
        self.forward(events).await;
        Ok(())
    }
}
