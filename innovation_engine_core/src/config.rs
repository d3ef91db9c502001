//! Session configuration and the endpoint URLs derived from it.
use std::time::Duration;

use chrono::Utc;
use url::Url;

use crate::{Error, Result};

/// Default environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: Environment = Environment::Prod;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

const ENDPOINT_PREFIX: &'static str = "/run/multi/v2/front";

/// Well-known server environments experiments are loaded from.
///
/// [`EngineConfig`] stores the environment as a plain string, so servers exposing additional
/// environments can be addressed as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production experiments.
    Prod,
    /// Experiments under development.
    Dev,
    /// Experiments under test.
    Test,
}

impl Environment {
    /// Returns the environment name as it appears in endpoint URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Dev => "dev",
            Environment::Test => "test",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> String {
        value.as_str().to_owned()
    }
}

/// Configuration for [`ExperimentFetcher`](crate::experiment_fetcher::ExperimentFetcher).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Identifier of this client installation. Attached to single experiment requests when set
    /// and required for batch experiment requests.
    pub client_id: Option<String>,
    /// Base address of the experiment loader server.
    pub loader_server: String,
    /// Environment experiments are loaded from.
    pub environment: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl EngineConfig {
    /// Creates a configuration for the given loader server, with the default environment and
    /// timeout and no client id.
    pub fn new(loader_server: impl Into<String>) -> EngineConfig {
        EngineConfig {
            client_id: None,
            loader_server: loader_server.into(),
            environment: DEFAULT_ENVIRONMENT.as_str().to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Endpoint URLs derived from the configured loader server and environment.
///
/// The two URLs are always derived as a pair. The cache buster segment is captured when the pair
/// is derived (at configuration time and when the server or environment changes), not per
/// request, so consecutive requests against an unchanged configuration hit the same URLs.
#[derive(Debug, Clone)]
pub(crate) struct EndpointUrls {
    /// URL serving a single experiment as an HTML document.
    pub(crate) loader: Url,
    /// URL serving a batch of experiments as JSON.
    pub(crate) experiments: Url,
}

impl EndpointUrls {
    pub(crate) fn derive(loader_server: &str, environment: &str) -> Result<EndpointUrls> {
        EndpointUrls::derive_at(loader_server, environment, Utc::now().timestamp())
    }

    fn derive_at(
        loader_server: &str,
        environment: &str,
        cache_buster: i64,
    ) -> Result<EndpointUrls> {
        let base = format!(
            "{}{}/{}/{}",
            loader_server, ENDPOINT_PREFIX, cache_buster, environment
        );
        let loader = Url::parse(&format!("{}/webview.html", base))
            .map_err(|err| Error::InvalidBaseUrl(err))?;
        let experiments = Url::parse(&format!("{}/webview.json", base))
            .map_err(|err| Error::InvalidBaseUrl(err))?;
        Ok(EndpointUrls {
            loader,
            experiments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EndpointUrls, EngineConfig, Environment};

    #[test]
    fn derives_loader_and_experiments_urls_as_a_pair() {
        let urls =
            EndpointUrls::derive_at("https://client.innovation-club.net", "prod", 1700000000)
                .unwrap();
        assert_eq!(
            urls.loader.as_str(),
            "https://client.innovation-club.net/run/multi/v2/front/1700000000/prod/webview.html"
        );
        assert_eq!(
            urls.experiments.as_str(),
            "https://client.innovation-club.net/run/multi/v2/front/1700000000/prod/webview.json"
        );
    }

    #[test]
    fn rejects_unparsable_loader_server() {
        let result = EndpointUrls::derive("not a server", "prod");
        assert!(matches!(result, Err(crate::Error::InvalidBaseUrl(_))));
    }

    #[test]
    fn defaults_to_prod_environment_and_half_second_timeout() {
        let config = EngineConfig::new("https://client.innovation-club.net");
        assert_eq!(config.client_id, None);
        assert_eq!(config.environment, Environment::Prod.as_str());
        assert_eq!(config.timeout.as_millis(), 500);
    }
}
