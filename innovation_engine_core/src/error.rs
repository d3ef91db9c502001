use std::sync::Arc;

/// Represents a result type for operations in the Innovation Engine SDK.
///
/// This type alias is used throughout the SDK to indicate the result of operations that may return
/// errors specific to the Innovation Engine SDK.
///
/// This `Result` type is a standard Rust `Result` type where the error variant is defined by the
/// SDK-specific [`Error`] enum.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing possible errors that can occur in the Innovation Engine SDK.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// Invalid loader server configuration.
    #[error("invalid loader_server configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// A batch experiments request was made without a configured client id.
    #[error("client_id is not configured")]
    MissingClientId,

    /// Network error, including request timeouts.
    #[error(transparent)]
    // reqwest::Error is not clonable, so we're wrapping it in an Arc.
    Transport(Arc<reqwest::Error>),

    /// The server response body is not valid UTF-8 or not valid JSON.
    #[error("failed to parse server response")]
    ParseFailure,

    /// The server returned a response with an empty experiment payload.
    #[error("server returned an empty experiment payload")]
    EmptyPayload,

    /// The rendered content sent a close event that is not valid JSON.
    #[error("failed to decode close event")]
    DecodeFailure(#[source] Arc<serde_json::Error>),

    /// The render session was dropped before the content sent a close event.
    #[error("render session closed without a close event")]
    SessionDropped,
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Transport(Arc::new(value.without_url()))
    }
}
