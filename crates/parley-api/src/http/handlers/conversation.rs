//! Conversation HTTP handlers.
//!
//! Endpoints:
//! - GET /api/v1/conversations      - List the caller's conversations
//! - GET /api/v1/conversations/{id} - Conversation with its full transcript

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use parley_types::chat::{Conversation, Transcript};
use uuid::Uuid;

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::PageQuery;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/conversations - Most recently updated first.
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if query.limit < 0 || query.offset < 0 {
        return Err(AppError::Validation(
            "limit and offset must not be negative".to_string(),
        ));
    }

    let conversations = state
        .chat_service
        .list_conversations(auth.user_id, Some(query.limit), Some(query.offset))
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(conversations, request_id, elapsed)
            .with_link("self", "/api/v1/conversations"),
    ))
}

/// GET /api/v1/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Transcript>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let conversation_id = parse_uuid(&id)?;
    let transcript = state
        .chat_service
        .get_transcript(auth.user_id, conversation_id)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(transcript, request_id, elapsed)
            .with_link("self", &format!("/api/v1/conversations/{conversation_id}")),
    ))
}
