//! In-memory `ChangeSource` driven from the test body.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stockrelay_core::error::SourceError;
use stockrelay_core::source::{ChangeSource, RawChangePayload};
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct Probe {
    subscribed: Mutex<Option<String>>,
    pinged: AtomicBool,
    closed: AtomicBool,
    delivered: AtomicUsize,
}

/// A change source whose payloads are pushed through a
/// [`ChangeSourceHandle`]. Dropping the handle exhausts the source once the
/// queued payloads have been received.
#[derive(Debug)]
pub struct ChannelChangeSource {
    payloads: mpsc::UnboundedReceiver<String>,
    probe: Arc<Probe>,
    channel: String,
    subscribe_error: Option<String>,
    ping_error: Option<String>,
}

/// Test-side end of a [`ChannelChangeSource`].
#[derive(Debug)]
pub struct ChangeSourceHandle {
    payloads: mpsc::UnboundedSender<String>,
    probe: Arc<Probe>,
}

impl ChannelChangeSource {
    /// Creates a source and the handle that feeds it.
    #[must_use]
    pub fn new() -> (Self, ChangeSourceHandle) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let probe = Arc::new(Probe::default());
        let source = Self {
            payloads: receiver,
            probe: Arc::clone(&probe),
            channel: String::new(),
            subscribe_error: None,
            ping_error: None,
        };
        let handle = ChangeSourceHandle {
            payloads: sender,
            probe,
        };
        (source, handle)
    }

    /// Makes every `subscribe` call fail with `message`.
    #[must_use]
    pub fn with_subscribe_error(mut self, message: &str) -> Self {
        self.subscribe_error = Some(message.to_owned());
        self
    }

    /// Makes every `ping` call fail with `message`.
    #[must_use]
    pub fn with_ping_error(mut self, message: &str) -> Self {
        self.ping_error = Some(message.to_owned());
        self
    }
}

#[async_trait]
impl ChangeSource for ChannelChangeSource {
    async fn subscribe(&mut self, channel: &str) -> Result<(), SourceError> {
        if let Some(message) = &self.subscribe_error {
            return Err(SourceError::Connection(message.clone()));
        }
        channel.clone_into(&mut self.channel);
        *self.probe.subscribed.lock().unwrap() = Some(channel.to_owned());
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), SourceError> {
        self.probe.pinged.store(true, Ordering::SeqCst);
        match &self.ping_error {
            Some(message) => Err(SourceError::Connection(message.clone())),
            None => Ok(()),
        }
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.probe.closed.store(true, Ordering::SeqCst);
        self.payloads.close();
        Ok(())
    }

    async fn recv(&mut self) -> Option<RawChangePayload> {
        let body = self.payloads.recv().await?;
        self.probe.delivered.fetch_add(1, Ordering::SeqCst);
        Some(RawChangePayload::new(self.channel.as_str(), body))
    }
}

impl ChangeSourceHandle {
    /// Queues a notification body.
    pub fn send(&self, body: &str) {
        // A closed source simply discards further payloads.
        let _ = self.payloads.send(body.to_owned());
    }

    /// Queues an empty notification.
    pub fn send_empty(&self) {
        self.send("");
    }

    /// The channel passed to the last successful `subscribe`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn subscribed_channel(&self) -> Option<String> {
        self.probe.subscribed.lock().unwrap().clone()
    }

    /// Whether `ping` was called.
    #[must_use]
    pub fn was_pinged(&self) -> bool {
        self.probe.pinged.load(Ordering::SeqCst)
    }

    /// Whether `close` was called.
    #[must_use]
    pub fn was_closed(&self) -> bool {
        self.probe.closed.load(Ordering::SeqCst)
    }

    /// Number of payloads handed out by `recv` so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.probe.delivered.load(Ordering::SeqCst)
    }
}
