mod api;
mod chat;
mod middleware;
mod worker;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use leadbot_llm::Responder;
use leadbot_mail::{DisabledMailer, EmailSender, ResendMailer};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, RateLimits},
    chat::ChatService,
    middleware::AuthState,
    worker::{JobQueue, Worker, JOB_QUEUE_CAPACITY},
};

/// How long queued side effects may keep running after the listener stops.
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = leadbot_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let knowledge = Arc::new(leadbot_core::load_knowledge(&config.knowledge_path)?);
    tracing::info!(company = %knowledge.company_name, "knowledge base loaded");

    let pool_config = leadbot_db::PoolConfig::from_app_config(&config);
    let pool = leadbot_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = leadbot_db::run_migrations(&pool).await?;
    tracing::info!(applied, "database migrations complete");

    let mailer: Arc<dyn EmailSender> = match config.resend_api_key.as_deref() {
        Some(key) => Arc::new(ResendMailer::new(key, &config.mail_from)?),
        None => {
            tracing::warn!("RESEND_API_KEY not set; outbound email disabled");
            Arc::new(DisabledMailer)
        }
    };

    let (jobs, rx) = JobQueue::bounded(JOB_QUEUE_CAPACITY);
    let worker = Worker {
        pool: pool.clone(),
        mailer,
        policy: Arc::new(leadbot_intel::SignalTierPolicy::default()),
        sales_email: config.sales_email.clone(),
        company_name: knowledge.company_name.clone(),
    }
    .spawn(rx);

    let responder = Responder::from_config(&config, Arc::clone(&knowledge));
    let state = AppState {
        pool,
        chat: Arc::new(ChatService::new(responder, jobs.clone())),
        jobs,
    };

    let auth = AuthState::from_env(config.is_development())?;
    let app = build_app(state, auth, RateLimits::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "leadbot server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router held the last queue handles; the worker stops once the
    // backlog is drained.
    if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker)
        .await
        .is_err()
    {
        tracing::warn!("background jobs still pending at shutdown, abandoning them");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
