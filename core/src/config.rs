//! Client configuration.
//!
//! # Design
//! `ClientConfig` is plain data with a `Default` for every field, so callers
//! either build one in code or overlay `SMQ_*` environment variables on the
//! defaults with `from_env`. Durations are stored in milliseconds to keep the
//! environment format trivial (`SMQ_TIMEOUT_MS=2500`).

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::SmqError;

/// Port the reference broker listens on.
pub const DEFAULT_PORT: u16 = 9620;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Identity of this client; names its inbox and subscriptions.
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Bound on every transport call and on each `retrieve`.
    pub timeout_ms: u64,
    pub outgoing_capacity: usize,
    pub incoming_capacity: usize,
    /// Pause after an empty or failed poll. Zero polls continuously.
    pub poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            timeout_ms: 1000,
            outgoing_capacity: 1024,
            incoming_capacity: 1024,
            poll_interval_ms: 0,
        }
    }
}

impl ClientConfig {
    pub fn new(name: &str, host: &str, port: u16) -> Self {
        Self {
            name: name.to_string(),
            host: host.to_string(),
            port,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `SMQ_NAME`, `SMQ_HOST`, `SMQ_PORT`,
    /// `SMQ_TIMEOUT_MS`, `SMQ_OUTGOING_CAPACITY`, `SMQ_INCOMING_CAPACITY` and
    /// `SMQ_POLL_INTERVAL_MS`.
    pub fn from_env() -> Result<Self, SmqError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("SMQ").try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_name() -> String {
    match std::env::var("USER") {
        Ok(user) if !user.is_empty() => user,
        _ => format!("smq-{}", Uuid::new_v4().simple()),
    }
}
