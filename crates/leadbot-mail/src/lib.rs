//! Outbound email: the [`EmailSender`] contract, a Resend client, and the
//! notification templates.

pub mod error;
pub mod resend;
pub mod sender;
pub mod templates;

pub use error::MailError;
pub use resend::ResendMailer;
pub use sender::{DisabledMailer, Email, EmailSender};
pub use templates::{
    contact_confirmation, contact_notification, escape_html, hot_lead_notification, ContactNotice,
    LeadNotice,
};
