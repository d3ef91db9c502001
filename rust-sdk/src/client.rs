use std::{collections::BTreeMap, sync::Arc, time::Duration};

#[cfg(doc)]
use innovation_engine_core::Error;
use innovation_engine_core::{
    bridge::{BridgeSession, CloseSignal, RenderSurface},
    experiment_fetcher::{ExperimentFetcher, TreatmentOverride},
    fonts::FontAssetRegistry,
    Experiment, Result,
};
use url::Url;

use crate::ClientConfig;

/// A client for the Innovation Engine API.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// The client is the host's handle on one engine session: it fetches experiments from the
/// loader server, keeps the registry of fonts to inject into rendered content, and starts
/// render sessions over a host-provided web surface.
///
/// # Examples
/// ```
/// # use innovation_engine::{Client, ClientConfig};
/// let client = ClientConfig::from_loader_server("https://your-instance.innovation-club.net")
///     .to_client()
///     .unwrap();
/// ```
pub struct Client {
    fetcher: ExperimentFetcher,
    fonts: Arc<FontAssetRegistry>,
}

impl Client {
    /// Create a new `Client` using the specified configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if the configured loader server does not parse into
    /// endpoint URLs.
    pub fn new(config: ClientConfig) -> Result<Client> {
        Ok(Client {
            fetcher: ExperimentFetcher::new(config.config)?,
            fonts: Arc::new(FontAssetRegistry::new()),
        })
    }

    /// Fetches the experiment the server selects for the given screen.
    ///
    /// Pass a [`TreatmentOverride`] to pin selection to a specific treatment, bypassing the
    /// server's normal selection (used by preview tooling).
    ///
    /// # Errors
    ///
    /// Returns an error in the following cases:
    /// - [`Error::Transport`] if the server cannot be reached within the configured timeout.
    /// - [`Error::ParseFailure`] if the response body is not valid UTF-8.
    /// - [`Error::EmptyPayload`] if the server has no content for the screen.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn test(client: &innovation_engine::Client) {
    /// match client.get_experiment("home", None).await {
    ///     Ok(experiment) => {
    ///         // render it
    ///     }
    ///     Err(err) => {
    ///         // fall back to the built-in UI
    ///     }
    /// }
    /// # }
    /// ```
    pub async fn get_experiment(
        &self,
        screen_id: &str,
        forced: Option<&TreatmentOverride>,
    ) -> Result<Experiment> {
        self.fetcher.fetch_experiment(screen_id, forced).await
    }

    /// Fetches experiments for a batch of screens in one request.
    ///
    /// The resulting vector follows the server's response order: each entry is `Some` if the
    /// server selected an experiment for the corresponding screen and `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error in the following cases:
    /// - [`Error::MissingClientId`] if no client id is configured.
    /// - [`Error::Transport`] if the server cannot be reached within the configured timeout.
    /// - [`Error::ParseFailure`] if the response body is not a valid experiments document.
    pub async fn get_experiments(
        &self,
        screen_ids: &[&str],
        forced: Option<&TreatmentOverride>,
    ) -> Result<Vec<Option<Experiment>>> {
        self.fetcher.fetch_experiments(screen_ids, forced).await
    }

    /// Registers a font to be injected into rendered experiments.
    ///
    /// `descriptors` distinguish variants of the same family (weight, style). Registering a
    /// (family name, descriptors) combination that is already registered is a no-op. Fonts may
    /// be registered at any time, including while an experiment is on screen; content receives
    /// whatever is registered at the moment it asks.
    pub fn add_font(
        &self,
        family_name: impl Into<String>,
        file_content: impl Into<Vec<u8>>,
        descriptors: Option<BTreeMap<String, String>>,
    ) {
        self.fonts.register(family_name, file_content, descriptors);
    }

    /// Starts rendering an experiment on the given surface.
    ///
    /// The host must have registered [`CHANNELS`](innovation_engine_core::bridge::CHANNELS) on
    /// the surface and arranged for incoming messages to reach [`BridgeSession::on_message`]
    /// before calling this; the experiment document is loaded as the last step, so no message
    /// from the content can be missed.
    ///
    /// Returns the session and a [`CloseSignal`] that resolves once the content reports its
    /// result and asks to be closed.
    pub fn start_experiment<S: RenderSurface>(
        &self,
        experiment: &Experiment,
        surface: S,
    ) -> (BridgeSession<S>, CloseSignal) {
        log::debug!(target: "innovation_engine", "starting experiment render");
        BridgeSession::start(experiment, surface, self.fonts.clone())
    }

    /// Updates the client id sent along with experiment requests.
    pub fn set_client_id(&self, client_id: impl Into<String>) {
        self.fetcher.set_client_id(client_id);
    }

    /// Points the client at a different loader server. Endpoint URLs are re-derived; requests
    /// already in flight keep the URLs they started with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if the address does not parse; the previous
    /// configuration stays in effect.
    pub fn set_loader_server(&self, loader_server: impl Into<String>) -> Result<()> {
        self.fetcher.set_loader_server(loader_server)
    }

    /// Switches the client to a different environment. Endpoint URLs are re-derived; requests
    /// already in flight keep the URLs they started with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if the derived URLs do not parse; the previous
    /// configuration stays in effect.
    pub fn set_environment(&self, environment: impl Into<String>) -> Result<()> {
        self.fetcher.set_environment(environment)
    }

    /// Applies a new request timeout. Requests already in flight keep the timeout they started
    /// with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP transport cannot be rebuilt; the previous
    /// configuration stays in effect.
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        self.fetcher.set_timeout(timeout)
    }

    /// Currently derived URL for single experiment requests.
    pub fn loader_url(&self) -> Url {
        self.fetcher.loader_url()
    }

    /// Currently derived URL for batch experiment requests.
    pub fn experiments_url(&self) -> Url {
        self.fetcher.experiments_url()
    }
}
