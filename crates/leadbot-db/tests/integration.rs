//! Offline tests for leadbot-db pool configuration and row helpers.
//! These tests do not require a live database connection.

use chrono::Utc;
use leadbot_core::{AppConfig, ContactStatus, Environment};
use leadbot_db::{ContactRow, DbError, PoolConfig, SubscriberRow};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use uuid::Uuid;

fn contact_with_status(status: &str) -> ContactRow {
    ContactRow {
        id: 1,
        public_id: Uuid::new_v4(),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        company: Some("Analytical Engines".to_string()),
        job_title: None,
        message: "Tell me about audit trails".to_string(),
        category: "sales".to_string(),
        status: status.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        knowledge_path: PathBuf::from("./config/knowledge.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        anthropic_api_key: None,
        primary_model: "claude-3-5-haiku-latest".to_string(),
        openai_api_key: None,
        fallback_model: "gpt-4o-mini".to_string(),
        llm_timeout_secs: 20,
        llm_max_tokens: 600,
        resend_api_key: None,
        mail_from: "Leadbot <noreply@example.com>".to_string(),
        sales_email: None,
        chat_rate_limit: 20,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn contact_row_parses_stored_status() {
    let row = contact_with_status("in_progress");
    assert_eq!(row.status().expect("valid status"), ContactStatus::InProgress);
}

#[test]
fn contact_row_rejects_unknown_status() {
    let row = contact_with_status("archived");
    match row.status() {
        Err(DbError::InvalidStoredValue { field, value }) => {
            assert_eq!(field, "contact status");
            assert_eq!(value, "archived");
        }
        other => panic!("expected InvalidStoredValue, got {other:?}"),
    }
}

#[test]
fn subscriber_is_active_until_unsubscribed() {
    let mut row = SubscriberRow {
        id: 3,
        email: "reader@example.com".to_string(),
        source: Some("footer".to_string()),
        subscribed_at: Utc::now(),
        unsubscribed_at: None,
    };
    assert!(row.is_active());

    row.unsubscribed_at = Some(Utc::now());
    assert!(!row.is_active());
}
