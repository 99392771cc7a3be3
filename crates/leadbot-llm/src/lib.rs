//! Completion providers for the chat assistant.
//!
//! [`Responder`] tries the primary provider, then the fallback, then falls
//! back to a fixed apology. Providers are reached through
//! [`CompletionProvider`] so tests can substitute their own.

pub mod anthropic;
pub mod error;
pub mod lazy;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod responder;

pub use anthropic::AnthropicClient;
pub use error::LlmError;
pub use lazy::LazyProvider;
pub use openai::OpenAiClient;
pub use prompt::{build_system_prompt, PromptContext};
pub use provider::{ChatMessage, CompletionProvider, ProviderSettings, Role};
pub use responder::{Generation, GenerationSource, Responder, MAX_HISTORY_MESSAGES};
