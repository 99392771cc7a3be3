mod analyze;
mod records;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::records::{ContactsCommands, SubscribersCommands};

#[derive(Debug, Parser)]
#[command(name = "leadbot-cli")]
#[command(about = "Leadbot command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Run a visitor message through the intelligence pipeline offline
    Analyze {
        /// The visitor message to analyse
        message: String,
        /// Serialized conversation context from a previous turn
        #[arg(long)]
        context: Option<String>,
        /// Session identifier for a fresh context
        #[arg(long, default_value = "cli")]
        session: String,
    },
    /// Contact form submissions
    Contacts {
        #[command(subcommand)]
        command: ContactsCommands,
    },
    /// Newsletter subscribers
    Subscribers {
        #[command(subcommand)]
        command: SubscribersCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Logs go to stderr so CSV and JSON output stay clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        None => println!("leadbot-cli ready; run with --help for commands"),
        Some(Commands::Analyze {
            message,
            context,
            session,
        }) => analyze::run_analyze(&message, context.as_deref(), &session)?,
        Some(Commands::Db { command }) => {
            let pool = connect().await?;
            match command {
                DbCommands::Ping => {
                    leadbot_db::ping(&pool).await?;
                    println!("database reachable");
                }
                DbCommands::Migrate => {
                    let applied = leadbot_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Some(Commands::Contacts { command }) => {
            let pool = connect().await?;
            records::run_contacts(&pool, command).await?;
        }
        Some(Commands::Subscribers { command }) => {
            let pool = connect().await?;
            records::run_subscribers(&pool, command).await?;
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<sqlx::PgPool> {
    let config = leadbot_core::load_app_config()?;
    let pool_config = leadbot_db::PoolConfig::from_app_config(&config);
    let pool = leadbot_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
