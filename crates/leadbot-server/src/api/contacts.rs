use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use leadbot_core::{ContactStatus, InquiryCategory};
use leadbot_db::{ContactRow, DbError, NewContact};
use leadbot_mail::ContactNotice;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;
use crate::worker::Job;

use super::{
    clean_optional, csv_response, is_plausible_email, map_db_error, normalize_limit, ApiError,
    ApiJson, ApiResponse, AppState, FieldError,
};

const MAX_NAME_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5_000;
const MAX_ORG_FIELD_CHARS: usize = 200;
const EXPORT_LIMIT: i64 = 100_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ContactSubmission {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    company: Option<String>,
    job_title: Option<String>,
    #[serde(default)]
    message: String,
    category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ContactReceipt {
    id: Uuid,
    status: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContactsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StatusChange {
    status: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ContactItem {
    id: Uuid,
    name: String,
    email: String,
    company: Option<String>,
    job_title: Option<String>,
    message: String,
    category: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ContactRow> for ContactItem {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            email: row.email,
            company: row.company,
            job_title: row.job_title,
            message: row.message,
            category: row.category,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A submission that passed validation, trimmed and typed.
struct ValidContact<'a> {
    name: &'a str,
    email: &'a str,
    company: Option<&'a str>,
    job_title: Option<&'a str>,
    message: &'a str,
    category: InquiryCategory,
}

fn validate(input: &ContactSubmission) -> Result<ValidContact<'_>, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = input.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        errors.push(FieldError::new(
            "name",
            format!("must be 1 to {MAX_NAME_CHARS} characters"),
        ));
    }
    let email = input.email.trim();
    if !is_plausible_email(email) {
        errors.push(FieldError::new("email", "must be a valid email address"));
    }
    let message = input.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        errors.push(FieldError::new(
            "message",
            format!("must be 1 to {MAX_MESSAGE_CHARS} characters"),
        ));
    }
    let company = clean_optional(input.company.as_deref());
    if company.is_some_and(|c| c.chars().count() > MAX_ORG_FIELD_CHARS) {
        errors.push(FieldError::new(
            "company",
            format!("must be at most {MAX_ORG_FIELD_CHARS} characters"),
        ));
    }
    let job_title = clean_optional(input.job_title.as_deref());
    if job_title.is_some_and(|t| t.chars().count() > MAX_ORG_FIELD_CHARS) {
        errors.push(FieldError::new(
            "jobTitle",
            format!("must be at most {MAX_ORG_FIELD_CHARS} characters"),
        ));
    }
    let category = match clean_optional(input.category.as_deref()) {
        None => Some(InquiryCategory::General),
        Some(raw) => InquiryCategory::parse(&raw.to_ascii_lowercase()),
    };
    let Some(category) = category else {
        errors.push(FieldError::new(
            "category",
            "must be one of general, sales, partnership, support, careers, press",
        ));
        return Err(errors);
    };

    if errors.is_empty() {
        Ok(ValidContact {
            name,
            email,
            company,
            job_title,
            message,
            category,
        })
    } else {
        Err(errors)
    }
}

fn parse_contact_id(request_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::new(request_id, "bad_request", "contact id must be a UUID"))
}

fn parse_status_filter(
    request_id: &str,
    raw: Option<&str>,
) -> Result<Option<ContactStatus>, ApiError> {
    match clean_optional(raw) {
        None => Ok(None),
        Some(value) => ContactStatus::parse(value).map(Some).ok_or_else(|| {
            ApiError::validation(
                request_id,
                vec![FieldError::new(
                    "status",
                    "must be one of new, in_progress, resolved",
                )],
            )
        }),
    }
}

/// POST /api/v1/contact
pub(super) async fn submit_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(input): ApiJson<ContactSubmission>,
) -> Result<(StatusCode, Json<ApiResponse<ContactReceipt>>), ApiError> {
    let valid = validate(&input).map_err(|errors| ApiError::validation(req_id.0.clone(), errors))?;

    let row = leadbot_db::create_contact(
        &state.pool,
        &NewContact {
            name: valid.name,
            email: valid.email,
            company: valid.company,
            job_title: valid.job_title,
            message: valid.message,
            category: valid.category,
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(
        contact_id = %row.public_id,
        category = valid.category.as_str(),
        "contact submitted"
    );

    state.jobs.submit(Job::NotifyContact {
        notice: Box::new(ContactNotice {
            name: valid.name.to_string(),
            email: valid.email.to_string(),
            company: valid.company.map(str::to_string),
            job_title: valid.job_title.map(str::to_string),
            category: valid.category.as_str().to_string(),
            message: valid.message.to_string(),
        }),
    });

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ContactReceipt {
                id: row.public_id,
                status: ContactStatus::New.as_str(),
            },
            req_id.0,
        )),
    ))
}

pub(super) async fn list_contacts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ContactsQuery>,
) -> Result<Json<ApiResponse<Vec<ContactItem>>>, ApiError> {
    let status = parse_status_filter(&req_id.0, query.status.as_deref())?;
    let rows = leadbot_db::list_contacts(&state.pool, status, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(ContactItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ContactItem>>, ApiError> {
    let id = parse_contact_id(&req_id.0, &id)?;
    let row = leadbot_db::get_contact(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(ContactItem::from(row), req_id.0)))
}

/// PATCH /api/v1/admin/contacts/{id}/status
pub(super) async fn update_contact_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<ApiResponse<ContactItem>>, ApiError> {
    let id = parse_contact_id(&req_id.0, &id)?;
    let Some(next) = ContactStatus::parse(change.status.trim()) else {
        return Err(ApiError::validation(
            req_id.0,
            vec![FieldError::new(
                "status",
                "must be one of new, in_progress, resolved",
            )],
        ));
    };

    match leadbot_db::update_contact_status(&state.pool, id, next).await {
        Ok(row) => {
            tracing::info!(contact_id = %id, status = next.as_str(), "contact status updated");
            Ok(Json(ApiResponse::new(ContactItem::from(row), req_id.0)))
        }
        Err(e @ DbError::InvalidTransition { .. }) => {
            Err(ApiError::new(req_id.0, "conflict", e.to_string()))
        }
        Err(e) => Err(map_db_error(req_id.0, &e)),
    }
}

pub(super) async fn delete_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_contact_id(&req_id.0, &id)?;
    leadbot_db::delete_contact(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(contact_id = %id, "contact deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn export_contacts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ContactsQuery>,
) -> Result<Response, ApiError> {
    let status = parse_status_filter(&req_id.0, query.status.as_deref())?;
    let rows = leadbot_db::list_contacts(&state.pool, status, EXPORT_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut body = Vec::new();
    leadbot_db::write_contacts_csv(&rows, &mut body).map_err(|e| {
        tracing::error!(error = %e, "contact export failed");
        ApiError::new(req_id.0.clone(), "internal_error", "export failed")
    })?;
    Ok(csv_response("contacts.csv", body))
}
