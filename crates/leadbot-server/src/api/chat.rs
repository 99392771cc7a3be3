use axum::{extract::State, Extension, Json};
use leadbot_intel::{CardTrigger, ContextSummary, ExtractedEntities};
use leadbot_llm::ChatMessage;
use serde::{Deserialize, Serialize};

use crate::chat::{ChatTurn, VisitorInfo};
use crate::middleware::RequestId;

use super::{is_plausible_email, ApiError, ApiJson, ApiResponse, AppState, FieldError};

const MAX_MESSAGE_CHARS: usize = 2_000;
const MAX_SESSION_ID_CHARS: usize = 100;
const MAX_PAGE_CONTEXT_CHARS: usize = 500;
const MAX_HISTORY_ENTRIES: usize = 50;
const MAX_USER_INFO_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatRequest {
    message: String,
    session_id: Option<String>,
    user_info: Option<UserInfo>,
    #[serde(alias = "context")]
    page_context: Option<String>,
    #[serde(default)]
    conversation_history: Vec<ChatMessage>,
    user_context: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UserInfo {
    name: Option<String>,
    email: Option<String>,
    company: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatResponse {
    response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    morph_trigger: Option<CardTrigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_follow_up: Option<&'static str>,
    extracted_info: ExtractedEntities,
    session_id: String,
    user_context: String,
    context_summary: ContextSummary,
    blocked: bool,
    used_fallback: bool,
    error: bool,
}

fn validate(request: &ChatRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();

    let message_chars = request.message.trim().chars().count();
    if message_chars == 0 {
        errors.push(FieldError::new("message", "must not be empty"));
    } else if message_chars > MAX_MESSAGE_CHARS {
        errors.push(FieldError::new(
            "message",
            format!("must be at most {MAX_MESSAGE_CHARS} characters"),
        ));
    }
    if request
        .session_id
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_SESSION_ID_CHARS)
    {
        errors.push(FieldError::new(
            "sessionId",
            format!("must be at most {MAX_SESSION_ID_CHARS} characters"),
        ));
    }
    if request
        .page_context
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_PAGE_CONTEXT_CHARS)
    {
        errors.push(FieldError::new(
            "pageContext",
            format!("must be at most {MAX_PAGE_CONTEXT_CHARS} characters"),
        ));
    }
    if request.conversation_history.len() > MAX_HISTORY_ENTRIES {
        errors.push(FieldError::new(
            "conversationHistory",
            format!("must have at most {MAX_HISTORY_ENTRIES} entries"),
        ));
    }
    if let Some(info) = &request.user_info {
        let too_long = [&info.name, &info.email, &info.company]
            .into_iter()
            .flatten()
            .any(|v| v.chars().count() > MAX_USER_INFO_CHARS);
        if too_long {
            errors.push(FieldError::new(
                "userInfo",
                format!("fields must be at most {MAX_USER_INFO_CHARS} characters"),
            ));
        }
        if info
            .email
            .as_deref()
            .map(str::trim)
            .is_some_and(|e| !e.is_empty() && !is_plausible_email(e))
        {
            errors.push(FieldError::new("userInfo.email", "must be a valid email address"));
        }
    }

    errors
}

/// POST /api/v1/chat
///
/// Provider failures never surface here: the turn degrades to an apology
/// with `error: true` and still answers 200.
pub(super) async fn chat(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, ApiError> {
    let errors = validate(&request);
    if !errors.is_empty() {
        return Err(ApiError::validation(req_id.0, errors));
    }

    let user_info = request.user_info.unwrap_or_default();
    let outcome = state
        .chat
        .handle_turn(ChatTurn {
            message: request.message.trim().to_string(),
            session_id: request.session_id,
            visitor: VisitorInfo {
                name: user_info.name,
                email: user_info.email,
                company: user_info.company,
            },
            page_context: request.page_context,
            history: request.conversation_history,
            user_context: request.user_context,
        })
        .await;

    let data = ChatResponse {
        response: outcome.response,
        morph_trigger: outcome.morph_trigger,
        card_follow_up: outcome.card_follow_up,
        extracted_info: outcome.extracted,
        session_id: outcome.context.session_id.clone(),
        user_context: outcome.context.serialize(),
        context_summary: outcome.context.summary(),
        blocked: outcome.blocked,
        used_fallback: outcome.used_fallback,
        error: outcome.error,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}
