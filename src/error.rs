//! Error taxonomy for the dispatch layer and provider adapters.

use thiserror::Error;

/// Errors surfaced by [`crate::Client`] and [`crate::Registry`].
#[derive(Debug, Error)]
pub enum Error {
    /// The model address lacks the `provider:model` separator or has an
    /// empty side.
    #[error("invalid model address '{address}': expected 'provider:model'")]
    MalformedAddress { address: String },

    /// The provider key has no registered adapter.
    #[error("unsupported provider '{key}', supported providers: {supported:?}")]
    UnsupportedProvider {
        key: String,
        supported: Vec<String>,
    },

    /// A required credential or setting was missing or invalid at adapter
    /// construction time.
    #[error("configuration error for provider '{provider}': {message}")]
    Configuration { provider: String, message: String },

    /// The request violated a structural precondition before any adapter
    /// was involved.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend call failed; forwarded unchanged from the adapter.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors that can occur inside a provider adapter.
///
/// Adapters never leak backend-specific error shapes past this boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (transport, timeout, decode).
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned an error response.
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The backend replied with 2xx but the body lacked the fields the
    /// adapter needs to produce a normalized response.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),
}
