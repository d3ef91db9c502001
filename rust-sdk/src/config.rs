use std::time::Duration;

use innovation_engine_core::{EngineConfig, Result};

use crate::Client;

/// Configuration for [`Client`].
///
/// # Examples
/// ```
/// # use innovation_engine::ClientConfig;
/// let client = ClientConfig::from_loader_server("https://your-instance.innovation-club.net")
///     .client_id("install-42")
///     .to_client();
/// ```
pub struct ClientConfig {
    pub(crate) config: EngineConfig,
}

impl ClientConfig {
    /// Create a default configuration for the given loader server address.
    ///
    /// ```
    /// # use innovation_engine::ClientConfig;
    /// ClientConfig::from_loader_server("https://your-instance.innovation-club.net");
    /// ```
    pub fn from_loader_server(loader_server: impl Into<String>) -> Self {
        ClientConfig {
            config: EngineConfig::new(loader_server),
        }
    }

    /// Set the client id sent along with experiment requests. A client id is required for batch
    /// experiment requests.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = Some(client_id.into());
        self
    }

    /// Set the environment experiments are loaded from. Defaults to
    /// [`Environment::Prod`](innovation_engine_core::Environment::Prod).
    ///
    /// Accepts anything convertible to a string, including
    /// [`Environment`](innovation_engine_core::Environment).
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    /// Set the request timeout. Defaults to
    /// [`DEFAULT_TIMEOUT`](innovation_engine_core::DEFAULT_TIMEOUT).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Create a new [`Client`] using the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`](innovation_engine_core::Error::InvalidBaseUrl) if the
    /// loader server address does not parse into endpoint URLs.
    ///
    /// ```
    /// # use innovation_engine::{Client, ClientConfig};
    /// let client: Client =
    ///     ClientConfig::from_loader_server("https://your-instance.innovation-club.net")
    ///         .to_client()
    ///         .unwrap();
    /// ```
    pub fn to_client(self) -> Result<Client> {
        Client::new(self)
    }
}
