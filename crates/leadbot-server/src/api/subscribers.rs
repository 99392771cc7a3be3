use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use leadbot_db::SubscriberRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    clean_optional, csv_response, is_plausible_email, map_db_error, normalize_limit, ApiError,
    ApiJson, ApiResponse, AppState, FieldError,
};

const MAX_SOURCE_CHARS: usize = 100;
const EXPORT_LIMIT: i64 = 100_000;

#[derive(Debug, Deserialize)]
pub(super) struct SubscribeRequest {
    #[serde(default)]
    email: String,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UnsubscribeRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscriptionStatus {
    email: String,
    subscribed: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct SubscribersQuery {
    #[serde(default)]
    pub active: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscriberItem {
    id: i64,
    email: String,
    source: Option<String>,
    active: bool,
    subscribed_at: chrono::DateTime<chrono::Utc>,
    unsubscribed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<SubscriberRow> for SubscriberItem {
    fn from(row: SubscriberRow) -> Self {
        Self {
            active: row.is_active(),
            id: row.id,
            email: row.email,
            source: row.source,
            subscribed_at: row.subscribed_at,
            unsubscribed_at: row.unsubscribed_at,
        }
    }
}

fn validate_email<'a>(request_id: &str, raw: &'a str) -> Result<&'a str, ApiError> {
    let email = raw.trim();
    if is_plausible_email(email) {
        Ok(email)
    } else {
        Err(ApiError::validation(
            request_id,
            vec![FieldError::new("email", "must be a valid email address")],
        ))
    }
}

/// POST /api/v1/subscribe
pub(super) async fn subscribe(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(input): ApiJson<SubscribeRequest>,
) -> Result<Json<ApiResponse<SubscriptionStatus>>, ApiError> {
    let email = validate_email(&req_id.0, &input.email)?;
    let source = clean_optional(input.source.as_deref());
    if source.is_some_and(|s| s.chars().count() > MAX_SOURCE_CHARS) {
        return Err(ApiError::validation(
            req_id.0,
            vec![FieldError::new(
                "source",
                format!("must be at most {MAX_SOURCE_CHARS} characters"),
            )],
        ));
    }

    let row = leadbot_db::upsert_subscriber(&state.pool, email, source)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(
        subscriber = %leadbot_core::fingerprint(&row.email),
        "newsletter subscription recorded"
    );

    Ok(Json(ApiResponse::new(
        SubscriptionStatus {
            email: row.email,
            subscribed: true,
        },
        req_id.0,
    )))
}

/// POST /api/v1/unsubscribe
///
/// Answers the same way whether or not the address was subscribed.
pub(super) async fn unsubscribe(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(input): ApiJson<UnsubscribeRequest>,
) -> Result<Json<ApiResponse<SubscriptionStatus>>, ApiError> {
    let email = validate_email(&req_id.0, &input.email)?;
    let changed = leadbot_db::unsubscribe(&state.pool, email)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if changed {
        tracing::info!(
            subscriber = %leadbot_core::fingerprint(&email.to_lowercase()),
            "newsletter subscription cancelled"
        );
    }

    Ok(Json(ApiResponse::new(
        SubscriptionStatus {
            email: email.to_lowercase(),
            subscribed: false,
        },
        req_id.0,
    )))
}

pub(super) async fn list_subscribers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SubscribersQuery>,
) -> Result<Json<ApiResponse<Vec<SubscriberItem>>>, ApiError> {
    let rows =
        leadbot_db::list_subscribers(&state.pool, query.active, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(SubscriberItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn delete_subscriber(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: i64 = id.parse().map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            "subscriber id must be an integer",
        )
    })?;
    leadbot_db::delete_subscriber(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::info!(subscriber_id = id, "subscriber deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn export_subscribers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SubscribersQuery>,
) -> Result<Response, ApiError> {
    let rows = leadbot_db::list_subscribers(&state.pool, query.active, EXPORT_LIMIT)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let mut body = Vec::new();
    leadbot_db::write_subscribers_csv(&rows, &mut body).map_err(|e| {
        tracing::error!(error = %e, "subscriber export failed");
        ApiError::new(req_id.0.clone(), "internal_error", "export failed")
    })?;
    Ok(csv_response("subscribers.csv", body))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use serde_json::json;
    use sqlx::PgPool;
    use tower::ServiceExt;

    #[test]
    fn email_is_trimmed_before_validation() {
        assert_eq!(
            validate_email("r", "  news@acme.io ").ok(),
            Some("news@acme.io")
        );
        assert!(validate_email("r", "news").is_err());
        assert!(validate_email("r", "").is_err());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected_before_the_database() {
        let app = test_app(StubProvider::replying("x"), StubProvider::replying("x"));
        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/api/v1/subscribe",
                &json!({"email": "not an email"}),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn subscribe_unsubscribe_and_resubscribe(pool: PgPool) {
        let app = test_app_with(
            pool.clone(),
            StubProvider::replying("x"),
            StubProvider::replying("x"),
            crate::middleware::AuthState::from_keys("", true).expect("auth"),
            100,
        );

        for _ in 0..2 {
            let response = app
                .router
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/v1/subscribe",
                    &json!({"email": "News@Acme.io", "source": "footer"}),
                ))
                .await
                .expect("subscribe");
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            assert_eq!(json["data"]["email"], "news@acme.io");
        }

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/unsubscribe",
                &json!({"email": "news@acme.io"}),
            ))
            .await
            .expect("unsubscribe");
        assert_eq!(response.status(), StatusCode::OK);

        let active = leadbot_db::list_subscribers(&pool, true, 10)
            .await
            .expect("list");
        assert!(active.is_empty());

        app.router
            .oneshot(json_request(
                "POST",
                "/api/v1/subscribe",
                &json!({"email": "news@acme.io"}),
            ))
            .await
            .expect("resubscribe");

        let all = leadbot_db::list_subscribers(&pool, false, 10)
            .await
            .expect("list");
        assert_eq!(all.len(), 1);
        assert!(all[0].is_active());
        assert_eq!(all[0].source.as_deref(), Some("footer"));
    }
}
