//! Contact and subscriber commands. Listings print a fixed-width table;
//! exports write CSV to stdout.

use clap::Subcommand;
use leadbot_core::ContactStatus;

/// Upper bound for a single export.
const EXPORT_LIMIT: i64 = 100_000;

#[derive(Debug, Subcommand)]
pub enum ContactsCommands {
    /// List recent contacts, newest first
    List {
        /// Filter by status (new, in_progress, resolved)
        #[arg(long)]
        status: Option<String>,
        /// Maximum number of contacts to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Write contacts as CSV to stdout
    Export {
        /// Filter by status (new, in_progress, resolved)
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubscribersCommands {
    /// Write subscribers as CSV to stdout
    Export {
        /// Skip unsubscribed addresses
        #[arg(long)]
        active: bool,
    },
}

pub(crate) fn parse_status(raw: Option<&str>) -> anyhow::Result<Option<ContactStatus>> {
    raw.map(|value| {
        ContactStatus::parse(value).ok_or_else(|| {
            anyhow::anyhow!("unknown status '{value}'; expected new, in_progress or resolved")
        })
    })
    .transpose()
}

pub(crate) async fn run_contacts(
    pool: &sqlx::PgPool,
    command: ContactsCommands,
) -> anyhow::Result<()> {
    match command {
        ContactsCommands::List { status, limit } => {
            let status = parse_status(status.as_deref())?;
            let rows = leadbot_db::list_contacts(pool, status, i64::from(limit)).await?;
            if rows.is_empty() {
                println!("no contacts found");
                return Ok(());
            }

            println!(
                "{:<38}{:<18}{:<13}{:<13}{:<32}NAME",
                "ID", "CREATED", "STATUS", "CATEGORY", "EMAIL"
            );
            for row in &rows {
                println!(
                    "{:<38}{:<18}{:<13}{:<13}{:<32}{}",
                    row.public_id,
                    row.created_at.format("%Y-%m-%d %H:%M"),
                    row.status,
                    row.category,
                    truncate(&row.email, 30),
                    truncate(&row.name, 40),
                );
            }
        }
        ContactsCommands::Export { status } => {
            let status = parse_status(status.as_deref())?;
            let rows = leadbot_db::list_contacts(pool, status, EXPORT_LIMIT).await?;
            leadbot_db::write_contacts_csv(&rows, std::io::stdout().lock())?;
            tracing::info!(rows = rows.len(), "contacts exported");
        }
    }
    Ok(())
}

pub(crate) async fn run_subscribers(
    pool: &sqlx::PgPool,
    command: SubscribersCommands,
) -> anyhow::Result<()> {
    match command {
        SubscribersCommands::Export { active } => {
            let rows = leadbot_db::list_subscribers(pool, active, EXPORT_LIMIT).await?;
            leadbot_db::write_subscribers_csv(&rows, std::io::stdout().lock())?;
            tracing::info!(rows = rows.len(), "subscribers exported");
        }
    }
    Ok(())
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", value.chars().take(max_chars - 3).collect::<String>())
    } else {
        value.to_string()
    }
}
