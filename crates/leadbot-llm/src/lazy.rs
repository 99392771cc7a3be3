//! Provider slots that build their client on first use.

use std::sync::Arc;

use async_trait::async_trait;
use leadbot_core::AppConfig;
use tokio::sync::OnceCell;
use tracing::info;

use crate::anthropic::AnthropicClient;
use crate::error::LlmError;
use crate::openai::OpenAiClient;
use crate::provider::{ChatMessage, CompletionProvider, ProviderSettings};

type Factory = Box<dyn Fn() -> Result<Arc<dyn CompletionProvider>, LlmError> + Send + Sync>;

/// A provider that is constructed once, the first time it is needed.
///
/// A slot without a factory is "not configured": every call fails with
/// [`LlmError::NotConfigured`]. A failed construction is not cached, so the
/// next call tries again.
pub struct LazyProvider {
    name: &'static str,
    cell: OnceCell<Arc<dyn CompletionProvider>>,
    factory: Option<Factory>,
}

impl LazyProvider {
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn CompletionProvider>, LlmError> + Send + Sync + 'static,
    {
        Self {
            name,
            cell: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    #[must_use]
    pub fn unconfigured(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
            factory: None,
        }
    }

    /// A slot that already holds `provider`.
    #[must_use]
    pub fn ready(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            name: provider.name(),
            cell: OnceCell::new_with(Some(provider)),
            factory: None,
        }
    }

    /// Primary slot: Anthropic, configured when `ANTHROPIC_API_KEY` is set.
    #[must_use]
    pub fn anthropic(config: &AppConfig) -> Self {
        match settings(config.anthropic_api_key.as_ref(), &config.primary_model, config) {
            Some(settings) => Self::new("anthropic", move || {
                info!(model = %settings.model, "initialising anthropic client");
                Ok(Arc::new(AnthropicClient::new(&settings)?) as Arc<dyn CompletionProvider>)
            }),
            None => Self::unconfigured("anthropic"),
        }
    }

    /// Fallback slot: OpenAI, configured when `OPENAI_API_KEY` is set.
    #[must_use]
    pub fn openai(config: &AppConfig) -> Self {
        match settings(config.openai_api_key.as_ref(), &config.fallback_model, config) {
            Some(settings) => Self::new("openai", move || {
                info!(model = %settings.model, "initialising openai client");
                Ok(Arc::new(OpenAiClient::new(&settings)?) as Arc<dyn CompletionProvider>)
            }),
            None => Self::unconfigured("openai"),
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.factory.is_some() || self.cell.initialized()
    }

    /// The underlying provider, building it on first call.
    ///
    /// # Errors
    ///
    /// [`LlmError::NotConfigured`] for an empty slot, or whatever the factory
    /// returned.
    pub async fn get(&self) -> Result<Arc<dyn CompletionProvider>, LlmError> {
        if let Some(provider) = self.cell.get() {
            return Ok(Arc::clone(provider));
        }
        let factory = self
            .factory
            .as_ref()
            .ok_or(LlmError::NotConfigured { provider: self.name })?;
        let provider = self.cell.get_or_try_init(|| async { factory() }).await?;
        Ok(Arc::clone(provider))
    }
}

fn settings(api_key: Option<&String>, model: &str, config: &AppConfig) -> Option<ProviderSettings> {
    api_key.map(|key| ProviderSettings {
        api_key: key.clone(),
        model: model.to_string(),
        max_tokens: config.llm_max_tokens,
        timeout_secs: config.llm_timeout_secs,
    })
}

#[async_trait]
impl CompletionProvider for LazyProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        self.get().await?.complete(system_prompt, messages).await
    }
}
