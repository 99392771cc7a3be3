//! Primary → fallback → apology reply generation.

use std::sync::Arc;

use leadbot_core::{AppConfig, KnowledgeBase};
use leadbot_intel::ConversationContext;
use serde::Serialize;
use tracing::{error, warn};

use crate::lazy::LazyProvider;
use crate::prompt::{build_system_prompt, PromptContext};
use crate::provider::{ChatMessage, CompletionProvider, Role};

/// Prior messages forwarded to a provider, newest kept.
pub const MAX_HISTORY_MESSAGES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Primary,
    Fallback,
    Apology,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub source: GenerationSource,
}

impl Generation {
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.source == GenerationSource::Fallback
    }

    /// Both providers failed.
    #[must_use]
    pub fn is_apology(&self) -> bool {
        self.source == GenerationSource::Apology
    }
}

pub struct Responder {
    primary: Arc<dyn CompletionProvider>,
    fallback: Arc<dyn CompletionProvider>,
    knowledge: Arc<KnowledgeBase>,
}

impl Responder {
    #[must_use]
    pub fn new(
        primary: Arc<dyn CompletionProvider>,
        fallback: Arc<dyn CompletionProvider>,
        knowledge: Arc<KnowledgeBase>,
    ) -> Self {
        Self {
            primary,
            fallback,
            knowledge,
        }
    }

    /// Anthropic primary and OpenAI fallback, each built on first use.
    #[must_use]
    pub fn from_config(config: &AppConfig, knowledge: Arc<KnowledgeBase>) -> Self {
        Self::new(
            Arc::new(LazyProvider::anthropic(config)),
            Arc::new(LazyProvider::openai(config)),
            knowledge,
        )
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    #[must_use]
    pub fn apology(&self) -> String {
        format!(
            "I'm sorry, I'm having trouble responding right now. Please email us at {} \
             and someone from our team will get back to you shortly.",
            self.knowledge.contact_email
        )
    }

    /// Produce a reply. Never fails: provider errors are logged and
    /// absorbed. The fallback is only called after the primary has failed.
    pub async fn generate(
        &self,
        message: &str,
        history: &[ChatMessage],
        context: &ConversationContext,
        page: Option<&str>,
    ) -> Generation {
        let system_prompt =
            build_system_prompt(&self.knowledge, &PromptContext::from_conversation(context, page));
        let mut messages = trim_history(history);
        messages.push(ChatMessage::user(message));

        match self.primary.complete(&system_prompt, &messages).await {
            Ok(text) => {
                return Generation {
                    text,
                    source: GenerationSource::Primary,
                }
            }
            Err(e) => warn!(
                session_id = %context.session_id,
                provider = self.primary.name(),
                error = %e,
                "primary provider failed, trying fallback"
            ),
        }

        match self.fallback.complete(&system_prompt, &messages).await {
            Ok(text) => Generation {
                text,
                source: GenerationSource::Fallback,
            },
            Err(e) => {
                error!(
                    session_id = %context.session_id,
                    provider = self.fallback.name(),
                    error = %e,
                    "fallback provider failed, returning apology"
                );
                Generation {
                    text: self.apology(),
                    source: GenerationSource::Apology,
                }
            }
        }
    }
}

/// Keep the newest [`MAX_HISTORY_MESSAGES`] non-empty messages, starting on
/// a visitor turn.
fn trim_history(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let kept: Vec<&ChatMessage> = history
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .collect();
    let start = kept.len().saturating_sub(MAX_HISTORY_MESSAGES);
    kept[start..]
        .iter()
        .skip_while(|m| m.role == Role::Assistant)
        .map(|m| (*m).clone())
        .collect()
}
