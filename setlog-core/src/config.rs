use std::env;
use std::time::Duration;
use thiserror::Error as ThisError;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be specified or present in the environment")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Connection settings for [`crate::db::Database`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        let database_url = database_url.into();
        // Every connection to ":memory:" opens a separate database.
        let max_connections = if is_in_memory(&database_url) {
            1
        } else {
            DEFAULT_MAX_CONNECTIONS
        };
        Self {
            database_url,
            max_connections,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        is_in_memory(&self.database_url)
    }

    /// Reads `DATABASE_URL`, `SETLOG_DB_MAX_CONNECTIONS` and
    /// `SETLOG_DB_BUSY_TIMEOUT_MS` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let mut config = Self::new(database_url);

        if let Some(value) = lookup("SETLOG_DB_MAX_CONNECTIONS") {
            let max = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid {
                    name: "SETLOG_DB_MAX_CONNECTIONS",
                    value: value.clone(),
                })?;
            config = config.with_max_connections(max);
        }

        if let Some(value) = lookup("SETLOG_DB_BUSY_TIMEOUT_MS") {
            let ms = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    name: "SETLOG_DB_BUSY_TIMEOUT_MS",
                    value: value.clone(),
                })?;
            config = config.with_busy_timeout(Duration::from_millis(ms));
        }

        if config.is_in_memory() {
            config.max_connections = 1;
        }

        Ok(config)
    }
}

fn is_in_memory(url: &str) -> bool {
    url == ":memory:" || url.contains("mode=memory")
}
