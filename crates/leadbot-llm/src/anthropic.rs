//! Anthropic Messages API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::provider::{api_error, ChatMessage, CompletionProvider, ProviderSettings};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";

pub struct AnthropicClient {
    client: Client,
    model: String,
    max_tokens: u32,
    endpoint: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidConfig`] if the key is not a valid header
    /// value, or [`LlmError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: &ProviderSettings) -> Result<Self, LlmError> {
        Self::with_base_url(settings, DEFAULT_BASE_URL)
    }

    /// Point the client at another host (wiremock in tests).
    ///
    /// # Errors
    ///
    /// Same as [`AnthropicClient::new`].
    pub fn with_base_url(settings: &ProviderSettings, base_url: &str) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&settings.api_key)
            .map_err(|_| LlmError::InvalidConfig("anthropic API key is not a valid header".into()))?;
        key.set_sensitive(true);
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages,
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        debug!(status = %status, model = %self.model, "anthropic response received");
        if !status.is_success() {
            return Err(api_error(PROVIDER, response).await);
        }

        let body = response.text().await?;
        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: "anthropic messages response".to_string(),
                source: e,
            })?;

        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            return Err(LlmError::EmptyCompletion { provider: PROVIDER });
        }
        Ok(text.trim().to_string())
    }
}
