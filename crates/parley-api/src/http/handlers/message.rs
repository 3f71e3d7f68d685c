//! Message edit, regeneration and version HTTP handlers.
//!
//! Endpoints:
//! - PUT  /api/v1/messages/{id}/edit       - Edit a user message, regenerate its reply
//! - POST /api/v1/messages/{id}/regenerate - Regenerate the reply to a user message
//! - GET  /api/v1/messages/{id}/versions   - Current message, neighbours, history

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use parley_types::chat::{EditOutcome, MessageVersions, RegenerationOutcome};
use serde::Deserialize;
use uuid::Uuid;

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for editing a message.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub new_content: String,
}

/// PUT /api/v1/messages/{id}/edit
///
/// Without a following assistant reply only the edit is applied and
/// `reply` is `null`.
pub async fn edit_message(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<EditRequest>,
) -> Result<Json<ApiResponse<EditOutcome>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message_id = parse_uuid(&id)?;
    let outcome = state
        .chat_service
        .edit_message(auth.user_id, message_id, &body.new_content)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(outcome, request_id, elapsed)
            .with_link("versions", &format!("/api/v1/messages/{message_id}/versions")),
    ))
}

/// POST /api/v1/messages/{id}/regenerate
pub async fn regenerate(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<RegenerationOutcome>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message_id = parse_uuid(&id)?;
    let outcome = state
        .chat_service
        .regenerate(auth.user_id, message_id)
        .await?;

    let reply_versions = format!("/api/v1/messages/{}/versions", outcome.reply.id);
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(outcome, request_id, elapsed).with_link("reply_versions", &reply_versions),
    ))
}

/// GET /api/v1/messages/{id}/versions
pub async fn get_versions(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageVersions>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let message_id = parse_uuid(&id)?;
    let versions = state
        .chat_service
        .message_versions(auth.user_id, message_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(versions, request_id, elapsed)))
}
