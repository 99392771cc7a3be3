//! Database operations for `subscribers`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: i64,
    pub email: String,
    pub source: Option<String>,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl SubscriberRow {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.unsubscribed_at.is_none()
    }
}

/// Subscribes `email`, idempotently. Emails are stored lowercased. A
/// previously unsubscribed address is reactivated with a fresh
/// `subscribed_at`; an active one is left untouched apart from filling in
/// a missing `source`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_subscriber(
    pool: &PgPool,
    email: &str,
    source: Option<&str>,
) -> Result<SubscriberRow, DbError> {
    let row = sqlx::query_as::<_, SubscriberRow>(
        "INSERT INTO subscribers (email, source) VALUES ($1, $2) \
         ON CONFLICT (email) DO UPDATE SET \
             source = COALESCE(subscribers.source, EXCLUDED.source), \
             subscribed_at = CASE WHEN subscribers.unsubscribed_at IS NULL \
                                  THEN subscribers.subscribed_at ELSE NOW() END, \
             unsubscribed_at = NULL \
         RETURNING id, email, source, subscribed_at, unsubscribed_at",
    )
    .bind(email.trim().to_lowercase())
    .bind(source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Stamps `unsubscribed_at`. Returns `false` when the address is unknown or
/// already unsubscribed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn unsubscribe(pool: &PgPool, email: &str) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE subscribers SET unsubscribed_at = NOW() \
         WHERE email = $1 AND unsubscribed_at IS NULL",
    )
    .bind(email.trim().to_lowercase())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Newest-first listing. With `active_only`, unsubscribed rows are skipped.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_subscribers(
    pool: &PgPool,
    active_only: bool,
    limit: i64,
) -> Result<Vec<SubscriberRow>, DbError> {
    let rows = sqlx::query_as::<_, SubscriberRow>(
        "SELECT id, email, source, subscribed_at, unsubscribed_at FROM subscribers \
         WHERE (NOT $1 OR unsubscribed_at IS NULL) \
         ORDER BY subscribed_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(active_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the delete fails.
pub async fn delete_subscriber(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM subscribers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
