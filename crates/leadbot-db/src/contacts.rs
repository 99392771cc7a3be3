//! Database operations for `contacts`.

use chrono::{DateTime, Utc};
use leadbot_core::{ContactStatus, InquiryCategory};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const CONTACT_COLUMNS: &str = "id, public_id, name, email, company, job_title, message, \
                               category, status, created_at, updated_at";

/// A row from the `contacts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub message: String,
    pub category: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRow {
    /// Typed status. The table's CHECK constraint keeps this in range.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStoredValue`] if the column holds an
    /// unknown value.
    pub fn status(&self) -> Result<ContactStatus, DbError> {
        ContactStatus::parse(&self.status).ok_or_else(|| DbError::InvalidStoredValue {
            field: "contact status",
            value: self.status.clone(),
        })
    }
}

/// Validated input for a new contact.
#[derive(Debug, Clone)]
pub struct NewContact<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub company: Option<&'a str>,
    pub job_title: Option<&'a str>,
    pub message: &'a str,
    pub category: InquiryCategory,
}

/// Inserts a contact in `new` status and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_contact(pool: &PgPool, contact: &NewContact<'_>) -> Result<ContactRow, DbError> {
    let sql = format!(
        "INSERT INTO contacts (public_id, name, email, company, job_title, message, category, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'new') \
         RETURNING {CONTACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(contact.name)
        .bind(contact.email)
        .bind(contact.company)
        .bind(contact.job_title)
        .bind(contact.message)
        .bind(contact.category.as_str())
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Fetches a contact by its public id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_contact(pool: &PgPool, public_id: Uuid) -> Result<ContactRow, DbError> {
    let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE public_id = $1");
    sqlx::query_as::<_, ContactRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Newest-first listing, optionally filtered by status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_contacts(
    pool: &PgPool,
    status: Option<ContactStatus>,
    limit: i64,
) -> Result<Vec<ContactRow>, DbError> {
    let sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts \
         WHERE ($1::TEXT IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    );
    let rows = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(status.map(ContactStatus::as_str))
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Moves a contact to `next`, enforcing [`ContactStatus::can_transition_to`].
///
/// The update is guarded on the status read beforehand, so a concurrent
/// change between the read and the write is reported as an invalid
/// transition rather than silently overwritten.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the contact does not exist,
/// [`DbError::InvalidTransition`] if the move is not allowed, or
/// [`DbError::Sqlx`] if a query fails.
pub async fn update_contact_status(
    pool: &PgPool,
    public_id: Uuid,
    next: ContactStatus,
) -> Result<ContactRow, DbError> {
    let current = get_contact(pool, public_id).await?.status()?;
    if !current.can_transition_to(next) {
        return Err(DbError::InvalidTransition {
            from: current,
            to: next,
        });
    }

    let sql = format!(
        "UPDATE contacts SET status = $1, updated_at = NOW() \
         WHERE public_id = $2 AND status = $3 \
         RETURNING {CONTACT_COLUMNS}"
    );
    sqlx::query_as::<_, ContactRow>(&sql)
        .bind(next.as_str())
        .bind(public_id)
        .bind(current.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::InvalidTransition {
            from: current,
            to: next,
        })
}

/// Deletes a contact. Only reachable from explicit operator actions.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the delete fails.
pub async fn delete_contact(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM contacts WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
