//! HTTP request handlers

use super::types::{
    ActivityListResponse, ActivityResponse, ConversationResponse, ErrorResponse, MessageRequest,
    MessageResponse,
};
use super::AppState;
use crate::db::DbError;
use crate::state_machine::Sender;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Inbound chat messages
        .route("/api/chats/:chat_id/messages", post(post_message))
        // Saved activities
        .route("/api/chats/:chat_id/activities", get(list_activities))
        .route("/api/chats/:chat_id/activities/:name", get(get_activity))
        // Conversation inspection
        .route("/api/chats/:chat_id/conversation", get(get_conversation))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Messages
// ============================================================

async fn post_message(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text cannot be empty".to_string()));
    }

    let sender = Sender::new(req.user_id, req.user_display_name);
    let replies = state
        .runtime
        .dispatch(chat_id, sender, req.text)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(MessageResponse { replies }))
}

// ============================================================
// Activities
// ============================================================

async fn list_activities(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Result<Json<ActivityListResponse>, AppError> {
    let activities = state
        .runtime
        .db()
        .list_activities(chat_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ActivityListResponse { activities }))
}

async fn get_activity(
    State(state): State<AppState>,
    Path((chat_id, name)): Path<(i64, String)>,
) -> Result<Json<ActivityResponse>, AppError> {
    let activity = state
        .runtime
        .db()
        .get_activity(chat_id, &name)
        .map_err(|e| match e {
            DbError::ActivityNotFound(_) => AppError::NotFound(e.to_string()),
            _ => AppError::Internal(e.to_string()),
        })?;

    Ok(Json(ActivityResponse { activity }))
}

// ============================================================
// Conversation
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
    Path(chat_id): Path<i64>,
) -> Json<ConversationResponse> {
    let conversation = state.runtime.conversation_state(chat_id).await;
    Json(ConversationResponse { conversation })
}

async fn get_version() -> &'static str {
    concat!("activity-bot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
