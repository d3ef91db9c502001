//! An HTTP client that fetches experiments from the loader server.
use std::{sync::RwLock, time::Duration};

use reqwest::header::ACCEPT;
use serde::Serialize;
use url::Url;

use crate::{
    config::{EndpointUrls, EngineConfig},
    experiment::ExperimentRecord,
    query::with_query_params,
    Error, Experiment, Result,
};

const CLIENT_ID_PARAM: &'static str = "nvtnclb-clientid";
const SCREEN_PARAM: &'static str = "nvtnclb-screen";
const EXPERIMENT_PARAM: &'static str = "nvtnclb-experiment";
const TREATMENT_PARAM: &'static str = "nvtnclb-treatment";

/// Pins experiment selection to a specific treatment, bypassing the server's normal selection.
///
/// The two identifiers are only meaningful together, so they travel as a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatmentOverride {
    /// Identifier of the experiment to force.
    pub experiment_id: String,
    /// Identifier of the treatment to force within that experiment.
    pub treatment_uuid: String,
}

/// Body of a batch experiments request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExperimentsRequest<'a> {
    client_id: &'a str,
    screen_ids: &'a [&'a str],
}

/// A client that fetches experiments from the loader server.
///
/// The fetcher owns the session configuration. Configuration changes apply to subsequent
/// requests; a request that is already in flight keeps the endpoint URL and timeout it started
/// with. Requests are independent: there is no internal queuing and no retrying, and overlapping
/// calls simply run concurrently on the shared connection pool.
pub struct ExperimentFetcher {
    state: RwLock<FetcherState>,
}

struct FetcherState {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::Client,
    config: EngineConfig,
    urls: EndpointUrls,
}

impl ExperimentFetcher {
    /// Creates a fetcher for the given configuration.
    ///
    /// Endpoint URLs are derived and the HTTP transport is built here, so an unparsable loader
    /// server is reported at construction rather than on first use.
    pub fn new(config: EngineConfig) -> Result<ExperimentFetcher> {
        let urls = EndpointUrls::derive(&config.loader_server, &config.environment)?;
        let client = build_client(config.timeout)?;

        Ok(ExperimentFetcher {
            state: RwLock::new(FetcherState {
                client,
                config,
                urls,
            }),
        })
    }

    /// Fetches the experiment the server selects for the given screen.
    ///
    /// The returned experiment's base URL is the full request URL, so relative resources inside
    /// the document resolve against the loader server.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the server cannot be reached within the configured
    /// timeout, [`Error::ParseFailure`] if the response body is not valid UTF-8, and
    /// [`Error::EmptyPayload`] if the server has no content for the screen.
    pub async fn fetch_experiment(
        &self,
        screen_id: &str,
        forced: Option<&TreatmentOverride>,
    ) -> Result<Experiment> {
        let (client, url) = {
            let state = self
                .state
                .read()
                .expect("thread holding fetcher lock should not panic");
            let url = with_query_params(
                &state.urls.loader,
                single_request_params(&state.config, screen_id, forced),
            );
            (state.client.clone(), url)
        };

        log::debug!(target: "innovation_engine", screen_id; "fetching experiment");
        let response = client.get(url.clone()).send().await?;
        let body = response.bytes().await?;

        let experiment = parse_experiment_body(&body, url)?;

        log::debug!(target: "innovation_engine", screen_id; "successfully fetched experiment");
        Ok(experiment)
    }

    /// Fetches experiments for a batch of screens in one request.
    ///
    /// The resulting vector follows the server's response order: each entry is `Some` if the
    /// server selected an experiment for the corresponding screen and `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingClientId`] if no client id is configured, [`Error::Transport`] if
    /// the server cannot be reached within the configured timeout, and [`Error::ParseFailure`]
    /// if the response body is not a valid experiments document.
    pub async fn fetch_experiments(
        &self,
        screen_ids: &[&str],
        forced: Option<&TreatmentOverride>,
    ) -> Result<Vec<Option<Experiment>>> {
        let (client, url, client_id) = {
            let state = self
                .state
                .read()
                .expect("thread holding fetcher lock should not panic");
            let Some(client_id) = state.config.client_id.clone() else {
                return Err(Error::MissingClientId);
            };
            let url = with_query_params(
                &state.urls.experiments,
                [
                    (EXPERIMENT_PARAM, forced.map(|f| f.experiment_id.as_str())),
                    (TREATMENT_PARAM, forced.map(|f| f.treatment_uuid.as_str())),
                ],
            );
            (state.client.clone(), url, client_id)
        };

        log::debug!(target: "innovation_engine", "fetching experiments for {} screens", screen_ids.len());
        let response = client
            .put(url)
            .header(ACCEPT, "application/json")
            .json(&ExperimentsRequest {
                client_id: &client_id,
                screen_ids,
            })
            .send()
            .await?;
        let body = response.bytes().await?;

        let experiments = parse_experiments_body(&body)?;

        log::debug!(target: "innovation_engine", "successfully fetched {} experiment records", experiments.len());
        Ok(experiments)
    }

    /// Updates the client id sent along with experiment requests.
    pub fn set_client_id(&self, client_id: impl Into<String>) {
        let mut state = self
            .state
            .write()
            .expect("thread holding fetcher lock should not panic");
        state.config.client_id = Some(client_id.into());
    }

    /// Points the fetcher at a different loader server.
    ///
    /// Both endpoint URLs are re-derived with a fresh cache buster. On an unparsable server
    /// address the previous configuration stays in effect.
    pub fn set_loader_server(&self, loader_server: impl Into<String>) -> Result<()> {
        let loader_server = loader_server.into();
        let mut state = self
            .state
            .write()
            .expect("thread holding fetcher lock should not panic");
        state.urls = EndpointUrls::derive(&loader_server, &state.config.environment)?;
        state.config.loader_server = loader_server;
        Ok(())
    }

    /// Switches the fetcher to a different environment.
    ///
    /// Both endpoint URLs are re-derived with a fresh cache buster. On an unparsable result the
    /// previous configuration stays in effect.
    pub fn set_environment(&self, environment: impl Into<String>) -> Result<()> {
        let environment = environment.into();
        let mut state = self
            .state
            .write()
            .expect("thread holding fetcher lock should not panic");
        state.urls = EndpointUrls::derive(&state.config.loader_server, &environment)?;
        state.config.environment = environment;
        Ok(())
    }

    /// Applies a new request timeout by rebuilding the HTTP transport. Requests already in
    /// flight keep the timeout they started with.
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        let client = build_client(timeout)?;
        let mut state = self
            .state
            .write()
            .expect("thread holding fetcher lock should not panic");
        state.config.timeout = timeout;
        state.client = client;
        Ok(())
    }

    /// Currently derived URL for single experiment requests.
    pub fn loader_url(&self) -> Url {
        let state = self
            .state
            .read()
            .expect("thread holding fetcher lock should not panic");
        state.urls.loader.clone()
    }

    /// Currently derived URL for batch experiment requests.
    pub fn experiments_url(&self) -> Url {
        let state = self
            .state
            .read()
            .expect("thread holding fetcher lock should not panic");
        state.urls.experiments.clone()
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(client)
}

fn single_request_params<'a>(
    config: &'a EngineConfig,
    screen_id: &'a str,
    forced: Option<&'a TreatmentOverride>,
) -> [(&'static str, Option<&'a str>); 4] {
    [
        (CLIENT_ID_PARAM, config.client_id.as_deref()),
        (SCREEN_PARAM, Some(screen_id)),
        (EXPERIMENT_PARAM, forced.map(|f| f.experiment_id.as_str())),
        (TREATMENT_PARAM, forced.map(|f| f.treatment_uuid.as_str())),
    ]
}

fn parse_experiment_body(body: &[u8], request_url: Url) -> Result<Experiment> {
    let Ok(html) = std::str::from_utf8(body) else {
        log::warn!(target: "innovation_engine", "failed to decode experiment payload: not valid UTF-8");
        return Err(Error::ParseFailure);
    };
    if html.is_empty() {
        log::warn!(target: "innovation_engine", "server returned an empty experiment payload");
        return Err(Error::EmptyPayload);
    }
    Ok(Experiment::new(html, Some(request_url)))
}

fn parse_experiments_body(body: &[u8]) -> Result<Vec<Option<Experiment>>> {
    let records: Vec<ExperimentRecord> = match serde_json::from_slice(body) {
        Ok(records) => records,
        Err(err) => {
            log::warn!(target: "innovation_engine", "failed to parse experiments response body: {:?}", err);
            return Err(Error::ParseFailure);
        }
    };

    Ok(records.into_iter().map(experiment_from_record).collect())
}

fn experiment_from_record(record: ExperimentRecord) -> Option<Experiment> {
    let html = record.html?;
    // An unparsable record URL leaves the experiment without a base for relative resources.
    let base_url = Url::parse(&record.url).ok();
    Some(Experiment::new(html, base_url))
}
