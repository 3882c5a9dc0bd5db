//! Configuration for ocilink sessions
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

/// Main configuration for a session instance
#[derive(Debug, Clone)]
pub struct SessionConfig {
    // -------------------------------------------------------------------------
    // Handshake Configuration
    // -------------------------------------------------------------------------
    /// Timeout for each authentication handshake step
    pub auth_timeout: Duration,

    // -------------------------------------------------------------------------
    // Request Configuration
    // -------------------------------------------------------------------------
    /// Deadline applied to every outgoing request; past it the pending
    /// entry is evicted and the waiter receives a timeout failure
    pub response_timeout: Duration,

    /// Interval at which the housekeeping thread sweeps expired requests
    pub sweep_interval: Duration,

    // -------------------------------------------------------------------------
    // Keep-Alive Configuration
    // -------------------------------------------------------------------------
    /// Idle time after which a no-op command is issued to keep the
    /// server-side session from being reclaimed
    pub keepalive_interval: Duration,

    /// Command name used for keep-alive probes
    pub keepalive_command: String,

    /// Expected response command name for keep-alive probes
    pub keepalive_response: String,

    // -------------------------------------------------------------------------
    // Teardown Configuration
    // -------------------------------------------------------------------------
    /// How long `close` waits for in-flight requests to drain before
    /// failing the remainder
    pub drain_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_timeout: Duration::from_secs(10),
            response_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_millis(250),
            keepalive_interval: Duration::from_secs(60),
            keepalive_command: "PingRequest".to_string(),
            keepalive_response: "PingResponse".to_string(),
            drain_timeout: Duration::from_secs(5),
        }
    }
}

impl SessionConfig {
    /// Create a new config builder
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for SessionConfig
#[derive(Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Set the authentication step timeout
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.config.auth_timeout = timeout;
        self
    }

    /// Set the per-request response timeout
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Set the housekeeping sweep interval
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Set the idle threshold for keep-alive probes
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.config.keepalive_interval = interval;
        self
    }

    /// Set the keep-alive command and expected response names
    pub fn keepalive_command(
        mut self,
        command: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.config.keepalive_command = command.into();
        self.config.keepalive_response = response.into();
        self
    }

    /// Set the close drain timeout
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.config.drain_timeout = timeout;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}
