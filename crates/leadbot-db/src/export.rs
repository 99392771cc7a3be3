//! CSV renderings of contact and subscriber listings, shared by the admin
//! API and the CLI.

use std::io::Write;

use crate::{ContactRow, SubscriberRow};

const CONTACT_HEADER: [&str; 9] = [
    "id",
    "created_at",
    "status",
    "category",
    "name",
    "email",
    "company",
    "job_title",
    "message",
];

const SUBSCRIBER_HEADER: [&str; 5] = ["id", "email", "source", "subscribed_at", "unsubscribed_at"];

/// Write `rows` as CSV with a header line.
///
/// # Errors
///
/// Returns [`csv::Error`] if writing to `out` fails.
pub fn write_contacts_csv<W: Write>(rows: &[ContactRow], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CONTACT_HEADER)?;
    for row in rows {
        writer.write_record([
            row.public_id.to_string(),
            row.created_at.to_rfc3339(),
            row.status.clone(),
            row.category.clone(),
            cell(&row.name),
            cell(&row.email),
            cell(row.company.as_deref().unwrap_or_default()),
            cell(row.job_title.as_deref().unwrap_or_default()),
            cell(&row.message),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// # Errors
///
/// Returns [`csv::Error`] if writing to `out` fails.
pub fn write_subscribers_csv<W: Write>(rows: &[SubscriberRow], out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(SUBSCRIBER_HEADER)?;
    for row in rows {
        writer.write_record([
            row.id.to_string(),
            cell(&row.email),
            cell(row.source.as_deref().unwrap_or_default()),
            row.subscribed_at.to_rfc3339(),
            row.unsubscribed_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Visitor-supplied text that a spreadsheet would evaluate as a formula is
/// prefixed with a quote.
fn cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@', '\t', '\r']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn contact(name: &str, company: Option<&str>) -> ContactRow {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("valid time");
        ContactRow {
            id: 1,
            public_id: Uuid::nil(),
            name: name.to_string(),
            email: "ada@example.com".to_string(),
            company: company.map(str::to_string),
            job_title: None,
            message: "Hello, \"team\"\nsecond line".to_string(),
            category: "sales".to_string(),
            status: "new".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn contacts_csv_has_header_and_quotes_fields() {
        let mut out = Vec::new();
        write_contacts_csv(&[contact("Ada", Some("Acme, Inc"))], &mut out).expect("write csv");
        let text = String::from_utf8(out).expect("utf8");

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,created_at,status,category,name,email,company,job_title,message")
        );
        assert!(text.contains("\"Acme, Inc\""));
        assert!(text.contains("\"Hello, \"\"team\"\"\nsecond line\""));
        assert!(text.contains("2026-03-01T12:00:00+00:00"));
    }

    #[test]
    fn formula_like_values_are_neutralised() {
        let mut out = Vec::new();
        write_contacts_csv(&[contact("=HYPERLINK(\"x\")", None)], &mut out).expect("write csv");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("'=HYPERLINK"));
    }

    #[test]
    fn subscribers_csv_leaves_active_unsubscribed_at_blank() {
        let row = SubscriberRow {
            id: 9,
            email: "reader@example.com".to_string(),
            source: None,
            subscribed_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).single().expect("valid time"),
            unsubscribed_at: None,
        };
        let mut out = Vec::new();
        write_subscribers_csv(&[row], &mut out).expect("write csv");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text.lines().nth(1),
            Some("9,reader@example.com,,2026-01-02T03:04:05+00:00,")
        );
    }
}
