//! Builder for `RentalClient` construction.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::{HttpClient, NetworkHttpClient};
use crate::logger;
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

use super::RentalClient;

/// Builder for [`RentalClient`].
///
/// # Example
///
/// ```no_run
/// use rental_client::{ClientConfig, RentalClient};
///
/// # async fn run() -> rental_client::ClientResult<()> {
/// let client = RentalClient::builder()
///     .config(ClientConfig::new("https://api.example.com/api").with_storage_path("./store.json"))
///     .build()?;
/// client.start().await;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct RentalClientBuilder {
    config: Option<ClientConfig>,
    http: Option<Arc<dyn HttpClient>>,
    storage: Option<Arc<dyn KeyValueStore>>,
    init_logging: bool,
}

impl RentalClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration (defaults to `ClientConfig::default()`).
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Injects the HTTP transport (defaults to reqwest).
    pub fn http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Injects durable storage (defaults to a file store when
    /// `storage_path` is configured, memory otherwise).
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Installs the global tracing subscriber from `log_level` and
    /// `log_json` during `build`. Off by default so embedding apps keep
    /// their own subscriber.
    pub fn init_logging(mut self, enabled: bool) -> Self {
        self.init_logging = enabled;
        self
    }

    /// Validates the configuration and wires the components.
    pub fn build(self) -> ClientResult<RentalClient> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        if self.init_logging
            && let Err(e) = logger::init_logger(&config.log_level, config.log_json)
        {
            tracing::debug!(error = %e, "Tracing subscriber already installed, keeping it");
        }

        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(NetworkHttpClient::new(
                &config.base_url,
                config.request_timeout,
            )?),
        };

        let storage: Arc<dyn KeyValueStore> = match (self.storage, &config.storage_path) {
            (Some(storage), _) => storage,
            (None, Some(path)) => Arc::new(FileStore::new(path)),
            (None, None) => {
                tracing::debug!("No storage path configured, session will not persist");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(RentalClient::assemble(config, http, storage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_can_be_requested_twice() {
        let config = ClientConfig::new("http://localhost:3000/api").with_logging("debug", true);
        let first = RentalClientBuilder::new()
            .config(config.clone())
            .init_logging(true)
            .build();
        assert!(first.is_ok());

        let second = RentalClientBuilder::new()
            .config(config)
            .init_logging(true)
            .build();
        assert!(second.is_ok());
        tracing::info!("Logging initialized");
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_wiring() {
        let result = RentalClientBuilder::new()
            .config(ClientConfig::new(""))
            .build();
        assert!(result.is_err());
    }
}
