use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TABLE_NAME: &str = "tarefas";
pub const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
pub const DEFAULT_SNAPSHOT_POLL_MS: u64 = 1000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive number of milliseconds, got {value:?}")]
    InvalidDuration { name: &'static str, value: String },
}

/// Process configuration, read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    /// Base of the share links, without a trailing slash.
    pub public_url: String,
    pub snapshot_poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            snapshot_poll_interval: Duration::from_millis(DEFAULT_SNAPSHOT_POLL_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let table_name = lookup("TABLE_NAME").unwrap_or(defaults.table_name);
        let public_url = lookup("PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.public_url);

        let snapshot_poll_interval = match lookup("SNAPSHOT_POLL_MS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::InvalidDuration {
                        name: "SNAPSHOT_POLL_MS",
                        value,
                    })
                }
            },
            None => defaults.snapshot_poll_interval,
        };

        Ok(Self {
            table_name,
            public_url,
            snapshot_poll_interval,
        })
    }
}
