use thiserror::Error;

/// Delivery failures. These stay inside the crate: [`crate::EmailSender::send`]
/// logs them and reports `false`.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("email provider returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid mailer configuration: {0}")]
    InvalidConfig(String),
}
