//! Test feeds — mock `StockChangeFeed` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use stockrelay_core::error::{SourceError, SubscriptionError};
use stockrelay_core::feed::StockChangeFeed;
use stockrelay_core::stock::StockChangeEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A feed that replays a fixed list of events and then closes its stream.
#[derive(Debug)]
pub struct StaticFeed {
    events: Mutex<Vec<StockChangeEvent>>,
}

impl StaticFeed {
    /// Create a feed that yields `events` in order on the first listen.
    #[must_use]
    pub fn new(events: Vec<StockChangeEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }
}

#[async_trait]
impl StockChangeFeed for StaticFeed {
    async fn listen_for_changes(
        &self,
        _cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StockChangeEvent>, SubscriptionError> {
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        let (sender, receiver) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so this never waits.
            sender
                .try_send(event)
                .expect("static feed channel sized for all events");
        }
        Ok(receiver)
    }
}

/// A feed that can never subscribe.
#[derive(Debug)]
pub struct FailingFeed;

#[async_trait]
impl StockChangeFeed for FailingFeed {
    async fn listen_for_changes(
        &self,
        _cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<StockChangeEvent>, SubscriptionError> {
        Err(SubscriptionError::Subscribe {
            channel: "stock_changes".into(),
            source: SourceError::Connection("connection refused".into()),
        })
    }
}
