//! Database operations for `chat_sessions`.
//!
//! A session row is a snapshot: each processed turn overwrites the tier,
//! completeness, and context with the latest values. Identity columns
//! (`name`, `email`, `company`) keep the first value written, mirroring the
//! first-write-wins rule of the conversation context itself.

use chrono::{DateTime, Utc};
use leadbot_core::PriorityTier;
use sqlx::PgPool;

use crate::DbError;

const SESSION_COLUMNS: &str = "id, session_id, priority_tier, completeness, engagement_level, \
                               name, email, company, page_context, message_count, context, \
                               notified_at, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatSessionRow {
    pub id: i64,
    pub session_id: String,
    pub priority_tier: String,
    pub completeness: i32,
    pub engagement_level: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub page_context: Option<String>,
    pub message_count: i32,
    pub context: serde_json::Value,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the intelligence worker knows about a session after a turn.
#[derive(Debug, Clone)]
pub struct SessionSnapshot<'a> {
    pub session_id: &'a str,
    pub tier: PriorityTier,
    pub completeness: u8,
    pub engagement_level: &'a str,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub company: Option<&'a str>,
    pub message_count: u32,
    pub context: serde_json::Value,
}

/// Records that a session exists (first message or page change) without
/// touching its intelligence columns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn record_chat_session(
    pool: &PgPool,
    session_id: &str,
    page_context: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO chat_sessions (session_id, page_context) VALUES ($1, $2) \
         ON CONFLICT (session_id) DO UPDATE SET \
             page_context = COALESCE(EXCLUDED.page_context, chat_sessions.page_context), \
             updated_at = NOW()",
    )
    .bind(session_id)
    .bind(page_context)
    .execute(pool)
    .await?;

    Ok(())
}

/// Inserts or overwrites the snapshot for `snapshot.session_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_chat_session(
    pool: &PgPool,
    snapshot: &SessionSnapshot<'_>,
) -> Result<ChatSessionRow, DbError> {
    let sql = format!(
        "INSERT INTO chat_sessions \
             (session_id, priority_tier, completeness, engagement_level, name, email, company, \
              message_count, context) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (session_id) DO UPDATE SET \
             priority_tier = EXCLUDED.priority_tier, \
             completeness = EXCLUDED.completeness, \
             engagement_level = EXCLUDED.engagement_level, \
             name = COALESCE(chat_sessions.name, EXCLUDED.name), \
             email = COALESCE(chat_sessions.email, EXCLUDED.email), \
             company = COALESCE(chat_sessions.company, EXCLUDED.company), \
             message_count = GREATEST(chat_sessions.message_count, EXCLUDED.message_count), \
             context = EXCLUDED.context, \
             updated_at = NOW() \
         RETURNING {SESSION_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ChatSessionRow>(&sql)
        .bind(snapshot.session_id)
        .bind(snapshot.tier.as_str())
        .bind(i32::from(snapshot.completeness))
        .bind(snapshot.engagement_level)
        .bind(snapshot.name)
        .bind(snapshot.email)
        .bind(snapshot.company)
        .bind(i32::try_from(snapshot.message_count).unwrap_or(i32::MAX))
        .bind(&snapshot.context)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Claims the one-time sales notification for a session. Returns `true`
/// only for the caller that flipped `notified_at` from NULL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_session_notified(pool: &PgPool, session_id: &str) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE chat_sessions SET notified_at = NOW() \
         WHERE session_id = $1 AND notified_at IS NULL",
    )
    .bind(session_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Most recently updated sessions, optionally restricted to one tier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_chat_sessions(
    pool: &PgPool,
    tier: Option<PriorityTier>,
    limit: i64,
) -> Result<Vec<ChatSessionRow>, DbError> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM chat_sessions \
         WHERE ($1::TEXT IS NULL OR priority_tier = $1) \
         ORDER BY updated_at DESC, id DESC \
         LIMIT $2"
    );
    let rows = sqlx::query_as::<_, ChatSessionRow>(&sql)
        .bind(tier.map(PriorityTier::as_str))
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
