//! Change listener: bridges a `ChangeSource` to a typed event stream.

use std::sync::Arc;

use async_trait::async_trait;
use stockrelay_core::error::{SourceError, SubscriptionError};
use stockrelay_core::feed::StockChangeFeed;
use stockrelay_core::source::{ChangeSource, STOCK_CHANGES_CHANNEL};
use stockrelay_core::stock::StockChangeEvent;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the handoff channel between the receive loop and its
/// consumer. A single slot keeps production in step with consumption.
const HANDOFF_CAPACITY: usize = 1;

/// Listens for stock change notifications on one channel of a change source.
///
/// At most one receive loop runs at a time and it owns the source while it
/// runs. [`StockListener::close`] stops that loop before closing the source.
#[derive(Debug)]
pub struct StockListener<S> {
    source: Arc<Mutex<S>>,
    channel: String,
    closing: CancellationToken,
}

impl<S> StockListener<S>
where
    S: ChangeSource + 'static,
{
    /// Creates a listener on the `stock_changes` channel.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_channel(source, STOCK_CHANGES_CHANNEL)
    }

    /// Creates a listener on a custom channel.
    #[must_use]
    pub fn with_channel(source: S, channel: impl Into<String>) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
            channel: channel.into(),
            closing: CancellationToken::new(),
        }
    }

    /// The channel this listener subscribes to.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Stops any running receive loop, ending its stream, then closes the
    /// underlying change source.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it fails to shut down cleanly.
    pub async fn close(&self) -> Result<(), SourceError> {
        self.closing.cancel();
        self.source.lock().await.close().await
    }
}

#[async_trait]
impl<S> StockChangeFeed for StockListener<S>
where
    S: ChangeSource + 'static,
{
    async fn listen_for_changes(
        &self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StockChangeEvent>, SubscriptionError> {
        let mut source = Arc::clone(&self.source).try_lock_owned().map_err(|_| {
            SubscriptionError::AlreadyListening {
                channel: self.channel.clone(),
            }
        })?;

        source
            .subscribe(&self.channel)
            .await
            .map_err(|source| SubscriptionError::Subscribe {
                channel: self.channel.clone(),
                source,
            })?;
        source.ping().await.map_err(SubscriptionError::Ping)?;

        info!(channel = %self.channel, "Listening for stock change notifications");

        let (events, receiver) = mpsc::channel(HANDOFF_CAPACITY);
        tokio::spawn(receive_loop(
            source,
            events,
            Stop {
                cancel,
                closing: self.closing.clone(),
            },
            self.channel.clone(),
        ));

        Ok(receiver)
    }
}

/// Either the caller's cancellation or the owner closing the listener.
struct Stop {
    cancel: CancellationToken,
    closing: CancellationToken,
}

impl Stop {
    async fn requested(&self) {
        tokio::select! {
            () = self.cancel.cancelled() => {}
            () = self.closing.cancelled() => {}
        }
    }
}

async fn receive_loop<S>(
    mut source: OwnedMutexGuard<S>,
    events: mpsc::Sender<StockChangeEvent>,
    stop: Stop,
    channel: String,
) where
    S: ChangeSource,
{
    loop {
        let payload = tokio::select! {
            biased;
            () = stop.requested() => break,
            payload = source.recv() => payload,
        };

        let Some(payload) = payload else {
            info!(channel = %channel, "Change source closed");
            break;
        };

        if payload.is_empty() {
            debug!(channel = %channel, "Received empty notification");
            continue;
        }

        let event = match StockChangeEvent::decode(payload.body()) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "Dropping undecodable stock change notification");
                continue;
            }
        };

        info!(
            product_id = event.product_id,
            branch_id = event.branch_id,
            "Received stock change notification"
        );

        tokio::select! {
            biased;
            () = stop.requested() => break,
            sent = events.send(event) => {
                if sent.is_err() {
                    debug!(channel = %channel, "Stock change consumer went away");
                    break;
                }
            }
        }
    }

    info!(channel = %channel, "Stopped listening for stock change notifications");
}
