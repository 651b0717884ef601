//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Client configuration for the rental backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "https://api.example.com/api")
    pub base_url: String,

    /// Per-request timeout; exceeded calls fail as `Timeout`
    pub request_timeout: Duration,

    /// Login attempts on transport failure (credential rejections never retry)
    pub login_max_attempts: u32,

    /// Linear backoff step between login attempts (attempt n waits n * step)
    pub login_backoff: Duration,

    /// Reservation poll interval
    pub reservation_poll_interval: Duration,

    /// Unread-notification counter poll interval
    pub unread_poll_interval: Duration,

    /// Default Snackbar display time
    pub snackbar_duration: Duration,

    /// JSON file backing durable storage (in-memory when unset)
    pub storage_path: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// JSON log output
    pub log_json: bool,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(15),
            login_max_attempts: 3,
            login_backoff: Duration::from_millis(500),
            reservation_poll_interval: Duration::from_secs(15),
            unread_poll_interval: Duration::from_secs(30),
            snackbar_duration: Duration::from_millis(3000),
            storage_path: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }

    /// Load from environment (and `.env` if present)
    ///
    /// Reads `RENTAL_API_URL`, `RENTAL_TIMEOUT_SECS`, `RENTAL_STORAGE_PATH`,
    /// `RENTAL_LOG_LEVEL` and `RENTAL_LOG_JSON`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let base_url = std::env::var("RENTAL_API_URL").unwrap_or_else(|_| {
            tracing::debug!("RENTAL_API_URL not set, using development default");
            DEFAULT_BASE_URL.to_string()
        });

        let mut config = Self::new(base_url);

        if let Some(secs) = std::env::var("RENTAL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("RENTAL_STORAGE_PATH") {
            config.storage_path = Some(PathBuf::from(path));
        }
        if let Ok(level) = std::env::var("RENTAL_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(json) = std::env::var("RENTAL_LOG_JSON") {
            config.log_json = matches!(json.as_str(), "1" | "true" | "yes");
        }

        config
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set login retry policy
    pub fn with_login_retry(mut self, max_attempts: u32, backoff: Duration) -> Self {
        self.login_max_attempts = max_attempts;
        self.login_backoff = backoff;
        self
    }

    /// Set poll intervals
    pub fn with_poll_intervals(mut self, reservations: Duration, unread: Duration) -> Self {
        self.reservation_poll_interval = reservations;
        self.unread_poll_interval = unread;
        self
    }

    /// Set the default Snackbar duration
    pub fn with_snackbar_duration(mut self, duration: Duration) -> Self {
        self.snackbar_duration = duration;
        self
    }

    /// Persist durable storage to a JSON file
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Set logging options
    pub fn with_logging(mut self, level: impl Into<String>, json: bool) -> Self {
        self.log_level = level.into();
        self.log_json = json;
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url is required".into()));
        }
        if self.login_max_attempts == 0 {
            return Err(ClientError::Config("login_max_attempts must be at least 1".into()));
        }
        if self.request_timeout.is_zero()
            || self.reservation_poll_interval.is_zero()
            || self.unread_poll_interval.is_zero()
        {
            return Err(ClientError::Config("timeouts and intervals must be non-zero".into()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
