//! Configuration for `LmsClient`
//!
//! Every field has a working default, so `ClientConfig::default()` talks to a
//! server on `127.0.0.1:9090` without credentials.

use std::time::Duration;

use lms_protocol::DEFAULT_PORT;
use lms_state::{Credentials, SessionOptions, DEFAULT_EVENT_BUFFER_SIZE, DEFAULT_MODE_QUERY_DELAY};

use crate::error::{ClientError, Result};

/// Configuration for an `LmsClient`
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or address
    /// Default: "127.0.0.1"
    pub host: String,

    /// Server CLI port
    /// Default: 9090
    pub port: u16,

    /// Log in before discovery when set
    /// Default: None
    pub credentials: Option<Credentials>,

    /// Timeout for establishing the TCP connection
    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Period of the per-player refresh queries
    /// Default: 30 seconds
    pub poll_interval: Duration,

    /// Delay before asking for the mode of a player that just powered on
    /// Default: 1.5 seconds
    pub mode_query_delay: Duration,

    /// Upper bound for `LmsClient::wait_for_discovery`
    /// Default: 30 seconds
    pub discovery_timeout: Duration,

    /// Longest accepted inbound line, `None` for unbounded
    /// Default: 1 MiB
    pub max_line_length: Option<usize>,

    /// Capacity of the change broadcast channel
    /// Default: 1000
    pub event_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            credentials: None,
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            mode_query_delay: DEFAULT_MODE_QUERY_DELAY,
            discovery_timeout: Duration::from_secs(30),
            max_line_length: Some(1024 * 1024),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a ClientConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `LMS_HOST`, `LMS_PORT`, `LMS_USERNAME` and
    /// `LMS_PASSWORD`, falling back to defaults for unset variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("LMS_HOST") {
            config.host = host;
        }

        if let Some(port) = lookup("LMS_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("LMS_PORT is not a port: {:?}", port)))?;
        }

        if let Some(username) = lookup("LMS_USERNAME") {
            let password = lookup("LMS_PASSWORD").unwrap_or_default();
            config.credentials = Some(Credentials::new(username, password));
        }

        Ok(config)
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::Config("Host must not be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ClientError::Config("Port must be greater than 0".to_string()));
        }

        if self.poll_interval.is_zero() {
            return Err(ClientError::Config(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.discovery_timeout.is_zero() {
            return Err(ClientError::Config(
                "Discovery timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_line_length == Some(0) {
            return Err(ClientError::Config(
                "Max line length must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(ClientError::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// `host:port` as used for connecting and in diagnostics
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn session_options(&self) -> SessionOptions {
        SessionOptions {
            credentials: self.credentials.clone(),
            mode_query_delay: self.mode_query_delay,
            event_buffer_size: self.event_buffer_size,
        }
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_mode_query_delay(mut self, delay: Duration) -> Self {
        self.mode_query_delay = delay;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_max_line_length(mut self, limit: Option<usize>) -> Self {
        self.max_line_length = limit;
        self
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }
}
