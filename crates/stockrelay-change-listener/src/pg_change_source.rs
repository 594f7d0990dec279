//! `PostgreSQL` implementation of the `ChangeSource` trait.

use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgListener, PgPoolOptions, PgSslMode};
use stockrelay_core::error::SourceError;
use stockrelay_core::source::{ChangeSource, RawChangePayload};
use tracing::{error, info, warn};

/// Connection parameters for the branch database.
#[derive(Clone)]
pub struct PgConnectionSettings {
    /// Database host name.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
}

impl PgConnectionSettings {
    /// Builds connect options with TLS disabled.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(PgSslMode::Disable)
    }
}

impl fmt::Debug for PgConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Change source backed by `LISTEN` on a dedicated PostgreSQL connection.
///
/// The connection is opened on `subscribe`. A dropped connection surfaces
/// as one empty payload and is re-established on the following receive.
pub struct PgChangeSource {
    pool: PgPool,
    listener: Option<PgListener>,
    channel: String,
    closed: bool,
}

impl PgChangeSource {
    /// Creates a source that will connect lazily using `settings`.
    #[must_use]
    pub fn new(settings: &PgConnectionSettings) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(settings.connect_options());
        Self::from_pool(pool)
    }

    /// Creates a source that takes its listener connection from `pool`.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            listener: None,
            channel: String::new(),
            closed: false,
        }
    }
}

impl fmt::Debug for PgChangeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgChangeSource")
            .field("channel", &self.channel)
            .field("connected", &self.listener.is_some())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn connection_error(err: &sqlx::Error) -> SourceError {
    SourceError::Connection(err.to_string())
}

#[async_trait]
impl ChangeSource for PgChangeSource {
    async fn subscribe(&mut self, channel: &str) -> Result<(), SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }

        if self.listener.is_none() {
            let listener = PgListener::connect_with(&self.pool)
                .await
                .map_err(|e| connection_error(&e))?;
            self.listener = Some(listener);
        }

        let listener = self.listener.as_mut().ok_or(SourceError::Closed)?;
        listener
            .listen(channel)
            .await
            .map_err(|e| connection_error(&e))?;
        self.channel = channel.to_owned();

        info!(channel, "Subscribed to PostgreSQL notification channel");
        Ok(())
    }

    async fn ping(&mut self) -> Result<(), SourceError> {
        if self.closed {
            return Err(SourceError::Closed);
        }
        let listener = self.listener.as_mut().ok_or(SourceError::NotSubscribed)?;
        sqlx::query("SELECT 1")
            .execute(listener)
            .await
            .map_err(|e| connection_error(&e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.closed = true;
        let unlistened = match self.listener.take() {
            Some(mut listener) => listener
                .unlisten_all()
                .await
                .map_err(|e| connection_error(&e)),
            None => Ok(()),
        };
        self.pool.close().await;
        unlistened
    }

    async fn recv(&mut self) -> Option<RawChangePayload> {
        let listener = self.listener.as_mut()?;
        match listener.try_recv().await {
            Ok(Some(notification)) => Some(RawChangePayload::new(
                notification.channel(),
                notification.payload(),
            )),
            Ok(None) => {
                warn!(channel = %self.channel, "PostgreSQL connection lost, reconnecting");
                Some(RawChangePayload::empty(self.channel.as_str()))
            }
            Err(err) => {
                error!(error = %err, "Postgres listener error");
                None
            }
        }
    }
}
