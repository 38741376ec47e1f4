//! Transport options: defaults, JSON file, environment overrides.
//!
//! Every field is optional in the file; missing fields take the defaults
//! below. Environment variables override the file:
//!
//! - `LLHLS_TIMEOUT_MS` - connect timeout
//! - `LLHLS_RW_TIMEOUT_MS` - caller read/write timeout
//! - `LLHLS_WINDOW_MODE` - `sliding` or `per_read`

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONNECT_TIMEOUT;
use crate::retry::RetryPolicy;
use crate::window::WindowMode;

/// Options a session is opened with.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct TransportOptions {
    /// Connect timeout in milliseconds. Falls back to `rw_timeout_ms`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Caller-level read/write timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rw_timeout_ms: Option<u64>,
    /// When false, writes wait for the socket to become writable first.
    pub nonblocking: bool,
    /// How the trailing window tracks received bytes.
    pub window_mode: WindowMode,
    /// Retry policy for refused connects.
    pub connect_retry: RetryPolicy,
    /// Retry policy for the chunk request send.
    pub send_retry: RetryPolicy,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            rw_timeout_ms: None,
            nonblocking: true,
            window_mode: WindowMode::default(),
            connect_retry: RetryPolicy::connect_default(),
            send_retry: RetryPolicy::send_default(),
        }
    }
}

impl TransportOptions {
    /// Load options from an optional JSON file, then apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut options = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        options.apply_env_overrides();
        Ok(options)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read transport config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parse transport config: {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup` (environment variable name → value).
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LLHLS_TIMEOUT_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.timeout_ms = Some(ms),
                Err(e) => log::warn!("[llhls] ignoring LLHLS_TIMEOUT_MS={value:?}: {e}"),
            }
        }

        if let Some(value) = lookup("LLHLS_RW_TIMEOUT_MS") {
            match value.parse::<u64>() {
                Ok(ms) => self.rw_timeout_ms = Some(ms),
                Err(e) => log::warn!("[llhls] ignoring LLHLS_RW_TIMEOUT_MS={value:?}: {e}"),
            }
        }

        if let Some(value) = lookup("LLHLS_WINDOW_MODE") {
            match value.parse::<WindowMode>() {
                Ok(mode) => self.window_mode = mode,
                Err(e) => log::warn!("[llhls] ignoring LLHLS_WINDOW_MODE: {e}"),
            }
        }
    }

    /// Effective connect timeout: own timeout, else the caller's read/write
    /// timeout, else 100 ms.
    pub fn connect_timeout(&self) -> Duration {
        self.timeout_ms
            .or(self.rw_timeout_ms)
            .map_or(DEFAULT_CONNECT_TIMEOUT, Duration::from_millis)
    }

    /// Bound for the writable wait on blocking writes. `None` waits forever.
    pub fn rw_timeout(&self) -> Option<Duration> {
        self.rw_timeout_ms.map(Duration::from_millis)
    }
}
