//! Resend (<https://resend.com>) HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use leadbot_core::fingerprint;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::MailError;
use crate::sender::{Email, EmailSender};

const DEFAULT_BASE_URL: &str = "https://api.resend.com";
const MAX_ERROR_CHARS: usize = 300;

pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    endpoint: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

impl ResendMailer {
    /// # Errors
    ///
    /// Returns [`MailError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, from: &str) -> Result<Self, MailError> {
        Self::with_base_url(api_key, from, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`MailError::Http`] if the HTTP client cannot be built, or
    /// [`MailError::InvalidConfig`] for an empty sender address.
    pub fn with_base_url(api_key: &str, from: &str, base_url: &str) -> Result<Self, MailError> {
        if from.trim().is_empty() {
            return Err(MailError::InvalidConfig("sender address is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            from: from.to_owned(),
            endpoint: format!("{}/emails", base_url.trim_end_matches('/')),
        })
    }

    async fn try_send(&self, email: &Email) -> Result<(), MailError> {
        let request = SendRequest {
            from: &self.from,
            to: [email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            reply_to: email.reply_to.as_deref(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            message: body.chars().take(MAX_ERROR_CHARS).collect(),
        })
    }
}

#[async_trait]
impl EmailSender for ResendMailer {
    async fn send(&self, email: &Email) -> bool {
        match self.try_send(email).await {
            Ok(()) => {
                info!(to = %fingerprint(&email.to), subject = %email.subject, "email sent");
                true
            }
            Err(e) => {
                warn!(to = %fingerprint(&email.to), error = %e, "email delivery failed");
                false
            }
        }
    }
}
