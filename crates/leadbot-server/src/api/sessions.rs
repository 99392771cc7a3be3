use axum::{
    extract::{Query, State},
    Extension, Json,
};
use leadbot_core::PriorityTier;
use leadbot_db::ChatSessionRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{clean_optional, map_db_error, normalize_limit, ApiError, ApiResponse, AppState, FieldError};

#[derive(Debug, Deserialize)]
pub(super) struct SessionsQuery {
    pub tier: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionItem {
    session_id: String,
    priority_tier: String,
    completeness: i32,
    engagement_level: String,
    name: Option<String>,
    email: Option<String>,
    company: Option<String>,
    page_context: Option<String>,
    message_count: i32,
    notified: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<ChatSessionRow> for SessionItem {
    fn from(row: ChatSessionRow) -> Self {
        Self {
            notified: row.notified_at.is_some(),
            session_id: row.session_id,
            priority_tier: row.priority_tier,
            completeness: row.completeness,
            engagement_level: row.engagement_level,
            name: row.name,
            email: row.email,
            company: row.company,
            page_context: row.page_context,
            message_count: row.message_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) async fn list_sessions(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<ApiResponse<Vec<SessionItem>>>, ApiError> {
    let tier = match clean_optional(query.tier.as_deref()) {
        None => None,
        Some(raw) => Some(PriorityTier::parse(raw).ok_or_else(|| {
            ApiError::validation(
                req_id.0.clone(),
                vec![FieldError::new("tier", "must be one of tier1, tier2, tier3")],
            )
        })?),
    };

    let rows = leadbot_db::list_chat_sessions(&state.pool, tier, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(SessionItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
