//! Client configuration: endpoints, credentials, and retry tuning.
//!
//! Every timing constant here is externally configurable and none of them
//! are protocol-negotiated; the defaults match the deployed authority.

use std::time::Duration;

use crate::backoff::{BackoffPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::error::CoordinatorError;

/// Default request/response endpoint.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Default watchdog poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Path of the realtime endpoint, relative to the service host.
const WS_PATH: &str = "/api/ws";

/// Configuration for one [`crate::GameClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Request/response base URL, e.g. `https://game.example.org`.
    pub base_url: String,
    /// Explicit websocket URL. When unset, derived from `base_url` by
    /// swapping the scheme and appending the realtime path.
    pub ws_url: Option<String>,
    /// Opaque bearer credential issued by the authentication collaborator.
    pub bearer_token: Option<String>,
    /// Cap on automatic reconnect attempts.
    pub reconnect_attempts: u32,
    /// Base delay unit for the linear reconnect backoff.
    pub backoff_base: Duration,
    /// Supervisor poll interval.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_url: None,
            bearer_token: None,
            reconnect_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BASE_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Backoff policy for the connection manager.
    #[must_use]
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.backoff_base, self.reconnect_attempts)
    }

    /// Resolve the realtime endpoint: the explicit override when present,
    /// otherwise the base URL with its scheme swapped to websocket.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidBaseUrl`] when the base URL has
    /// neither an `http://` nor an `https://` scheme.
    pub fn websocket_url(&self) -> Result<String, CoordinatorError> {
        if let Some(url) = &self.ws_url {
            return Ok(url.clone());
        }

        let base = self.base_url.trim_end_matches('/');
        if let Some(rest) = base.strip_prefix("http://") {
            return Ok(format!("ws://{rest}{WS_PATH}"));
        }
        if let Some(rest) = base.strip_prefix("https://") {
            return Ok(format!("wss://{rest}{WS_PATH}"));
        }

        Err(CoordinatorError::InvalidBaseUrl(self.base_url.clone()))
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
