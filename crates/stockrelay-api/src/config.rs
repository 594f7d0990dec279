//! Service configuration read from environment variables.

use std::path::PathBuf;

use stockrelay_change_listener::PgConnectionSettings;
use stockrelay_hq_client::HqSettings;

use crate::error::AppError;

/// Log directory used in deployed containers.
const DEFAULT_LOG_DIR: &str = "/app/logs";

/// Log directory used when `TESTING` is set.
const TESTING_LOG_DIR: &str = "logs";

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Branch database connection.
    pub database: PgConnectionSettings,
    /// Port the health endpoint listens on.
    pub service_port: u16,
    /// HQ collector endpoint and credential.
    pub hq: HqSettings,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first missing or invalid
    /// variable.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`. Variables are checked in a
    /// fixed order and the first failure is reported.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first missing or invalid
    /// variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} is required")))
        };

        let host = required("DB_HOST")?;
        let port = parse_port("DB_PORT", &required("DB_PORT")?)?;
        let database = required("DB_NAME")?;
        let user = required("DB_USER")?;
        let password = required("DB_PASSWORD")?;
        let service_port = parse_port("SERVICE_PORT", &required("SERVICE_PORT")?)?;
        let endpoint = required("HQ_END_POINT")?;
        let authorization = required("HQ_BASIC_AUTHORIZATION")?;

        Ok(Self {
            database: PgConnectionSettings {
                host,
                port,
                database,
                user,
                password,
            },
            service_port,
            hq: HqSettings {
                endpoint,
                authorization,
            },
        })
    }
}

/// Directory for log files: `LOG_DIR` if set, otherwise `logs` under
/// `TESTING` and `/app/logs` in deployment.
pub fn log_dir_from_env() -> PathBuf {
    log_dir_from_lookup(|key| std::env::var(key).ok())
}

/// Resolves the log directory through `lookup`.
pub fn log_dir_from_lookup<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("LOG_DIR").filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    match lookup("TESTING") {
        Some(flag) if !flag.is_empty() => PathBuf::from(TESTING_LOG_DIR),
        _ => PathBuf::from(DEFAULT_LOG_DIR),
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, AppError> {
    value
        .parse()
        .map_err(|e| AppError::Config(format!("{key} must be a valid u16: {e}")))
}
