use async_trait::async_trait;
use leadbot_core::fingerprint;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
}

/// Sends one message. Never errors: failures are logged by the
/// implementation and reported as `false`.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> bool;
}

/// Used when no email provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMailer;

#[async_trait]
impl EmailSender for DisabledMailer {
    async fn send(&self, email: &Email) -> bool {
        debug!(
            to = %fingerprint(&email.to),
            subject = %email.subject,
            "mail disabled, dropping message"
        );
        false
    }
}
