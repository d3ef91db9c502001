use serde::Deserialize;
use url::Url;

/// A server-defined experiment: an HTML/JS document representing a UI variant, ready to be
/// rendered in an embedded web surface.
///
/// Experiments are immutable once fetched. [`html`](Experiment::html) is the document to load
/// and [`base_url`](Experiment::base_url) is the URL relative resources inside the document are
/// resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    html: String,
    base_url: Option<Url>,
}

impl Experiment {
    /// Creates an experiment from an HTML payload and the URL it was loaded from.
    pub fn new(html: impl Into<String>, base_url: Option<Url>) -> Experiment {
        Experiment {
            html: html.into(),
            base_url,
        }
    }

    /// The HTML document to render.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The URL relative resources in the document are resolved against.
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }
}

/// A single entry of a batch experiments response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExperimentRecord {
    pub(crate) url: String,
    /// Missing when the server has no experiment for the requested screen.
    pub(crate) html: Option<String>,
}
