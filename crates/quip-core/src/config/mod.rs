//! Sync configuration shared by all clients.
//!
//! `SyncSettings` describes where the remote quote collection lives, how often
//! the periodic sync runs and how long a single transport call may take.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::non_blank;

/// Public mock collection used when nothing else is configured
pub const DEFAULT_SYNC_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 4;

/// Remote sync settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    /// Collection endpoint used for both pull (GET) and push (POST)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Seconds between periodic sync cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound for a single pull or push, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            timeout_secs: DEFAULT_TRANSPORT_TIMEOUT_SECS,
        }
    }
}

impl SyncSettings {
    /// Normalize the endpoint and reject zero durations
    pub fn validated(mut self) -> Result<Self> {
        self.endpoint = normalize_endpoint(&self.endpoint)?;
        if self.interval_secs == 0 {
            return Err(Error::Config("sync interval must be at least 1 second".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("transport timeout must be at least 1 second".into()));
        }
        Ok(self)
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Trim an endpoint, require an http(s) scheme and drop trailing slashes
pub fn normalize_endpoint(raw: &str) -> Result<String> {
    let endpoint =
        non_blank(raw).ok_or_else(|| Error::Config("endpoint must not be empty".into()))?;
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "endpoint must include http:// or https://".into(),
        ))
    }
}

fn default_endpoint() -> String {
    DEFAULT_SYNC_ENDPOINT.to_string()
}

const fn default_interval_secs() -> u64 {
    DEFAULT_SYNC_INTERVAL_SECS
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TRANSPORT_TIMEOUT_SECS
}
