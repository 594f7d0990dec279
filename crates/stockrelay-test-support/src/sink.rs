//! Test sinks — mock `StockSink` implementations for tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use stockrelay_core::error::SendError;
use stockrelay_core::sink::StockSink;
use stockrelay_core::stock::StockChangeEvent;

/// A sink that records every event it is asked to send. Sends for product
/// ids registered with [`RecordingSink::failing_for`] are recorded and then
/// answered with HTTP 500.
#[derive(Debug, Default)]
pub struct RecordingSink {
    attempted: Mutex<Vec<StockChangeEvent>>,
    failing_products: HashSet<i64>,
}

impl RecordingSink {
    /// Create a sink that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that rejects events for the given product ids.
    #[must_use]
    pub fn failing_for(product_ids: &[i64]) -> Self {
        Self {
            attempted: Mutex::new(Vec::new()),
            failing_products: product_ids.iter().copied().collect(),
        }
    }

    /// Returns a snapshot of every attempted event, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attempted(&self) -> Vec<StockChangeEvent> {
        self.attempted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StockSink for RecordingSink {
    async fn send(&self, event: &StockChangeEvent) -> Result<(), SendError> {
        self.attempted.lock().unwrap().push(event.clone());
        if self.failing_products.contains(&event.product_id) {
            return Err(SendError::HttpStatus(500));
        }
        Ok(())
    }
}

/// A sink whose every send fails at the transport level.
#[derive(Debug)]
pub struct FailingSink;

#[async_trait]
impl StockSink for FailingSink {
    async fn send(&self, _event: &StockChangeEvent) -> Result<(), SendError> {
        Err(SendError::Transport("connection refused".into()))
    }
}
