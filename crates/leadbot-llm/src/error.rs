use thiserror::Error;

/// Errors returned by completion providers.
///
/// Messages never include API keys; upstream bodies are truncated.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key was configured for this provider.
    #[error("{provider} provider is not configured")]
    NotConfigured { provider: &'static str },

    /// Network, TLS, or timeout failure from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("{provider} returned {status}: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A 2xx response that carried no text.
    #[error("{provider} returned an empty completion")]
    EmptyCompletion { provider: &'static str },

    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// Longest upstream error text kept in [`LlmError::Api`].
const MAX_ERROR_CHARS: usize = 300;

pub(crate) fn truncate_error(body: &str) -> String {
    body.chars().take(MAX_ERROR_CHARS).collect()
}
