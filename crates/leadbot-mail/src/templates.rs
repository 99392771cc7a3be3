//! HTML bodies for the three notification emails. Every interpolated value
//! passes through [`escape_html`].

use crate::sender::Email;

/// A submitted contact-form entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactNotice {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub category: String,
    pub message: String,
}

/// What sales needs to know about a hot chat lead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadNotice {
    pub session_id: String,
    pub tier_label: String,
    pub name: Option<String>,
    pub email: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub pain_points: Vec<String>,
    pub compliance_frameworks: Vec<String>,
    pub buying_signals: Vec<String>,
    pub completeness: u8,
}

#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn row(label: &str, value: &str) -> String {
    format!(
        "<tr><td style=\"padding:4px 12px 4px 0;color:#555\">{}</td><td>{}</td></tr>",
        escape_html(label),
        escape_html(value)
    )
}

fn optional_row(label: &str, value: Option<&str>) -> String {
    value.map(|v| row(label, v)).unwrap_or_default()
}

fn list_row(label: &str, values: &[String]) -> String {
    if values.is_empty() {
        String::new()
    } else {
        row(label, &values.join(", "))
    }
}

/// Acknowledgement sent to the visitor who filled in the form.
#[must_use]
pub fn contact_confirmation(notice: &ContactNotice, company_name: &str) -> Email {
    let html = format!(
        "<p>Hi {name},</p>\
         <p>Thanks for reaching out to {company}. We received your message and \
         someone from our team will reply within one business day.</p>\
         <blockquote style=\"color:#555\">{message}</blockquote>",
        name = escape_html(&notice.name),
        company = escape_html(company_name),
        message = escape_html(&notice.message).replace('\n', "<br>"),
    );
    Email {
        to: notice.email.clone(),
        subject: format!("We received your message - {company_name}"),
        html,
        reply_to: None,
    }
}

/// Internal alert for a new contact-form entry.
#[must_use]
pub fn contact_notification(notice: &ContactNotice, sales_inbox: &str) -> Email {
    let rows = [
        row("Name", &notice.name),
        row("Email", &notice.email),
        optional_row("Company", notice.company.as_deref()),
        optional_row("Job title", notice.job_title.as_deref()),
        row("Category", &notice.category),
    ]
    .concat();
    let html = format!(
        "<h2>New contact request</h2><table>{rows}</table><p>{message}</p>",
        message = escape_html(&notice.message).replace('\n', "<br>"),
    );
    Email {
        to: sales_inbox.to_string(),
        subject: format!("New {} inquiry from {}", notice.category, notice.name),
        html,
        reply_to: Some(notice.email.clone()),
    }
}

/// Internal alert for a chat session scored as hot.
#[must_use]
pub fn hot_lead_notification(lead: &LeadNotice, sales_inbox: &str) -> Email {
    let rows = [
        optional_row("Name", lead.name.as_deref()),
        row("Email", &lead.email),
        optional_row("Company", lead.company.as_deref()),
        optional_row("Job title", lead.job_title.as_deref()),
        optional_row("Industry", lead.industry.as_deref()),
        optional_row("Company size", lead.company_size.as_deref()),
        list_row("Pain points", &lead.pain_points),
        list_row("Compliance", &lead.compliance_frameworks),
        list_row("Buying signals", &lead.buying_signals),
        row("Profile completeness", &format!("{}%", lead.completeness)),
        row("Session", &lead.session_id),
    ]
    .concat();
    let who = lead
        .company
        .as_deref()
        .or(lead.name.as_deref())
        .unwrap_or("a chat visitor");
    Email {
        to: sales_inbox.to_string(),
        subject: format!("{} lead: {who}", capitalize(&lead.tier_label)),
        html: format!("<h2>Chat lead ready for follow-up</h2><table>{rows}</table>"),
        reply_to: Some(lead.email.clone()),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
