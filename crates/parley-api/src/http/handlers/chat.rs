//! Send-message HTTP handler.
//!
//! Endpoint:
//! - POST /api/v1/chat - Append a user message and generate the reply

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use parley_types::chat::ChatExchange;
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new conversation.
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    pub message: String,
}

/// POST /api/v1/chat
pub async fn send_message(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatExchange>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let exchange = state
        .chat_service
        .send_message(auth.user_id, body.conversation_id, &body.message)
        .await?;

    let conversation_link = format!("/api/v1/conversations/{}", exchange.conversation.id);
    let versions_link = format!("/api/v1/messages/{}/versions", exchange.user_message.id);
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(exchange, request_id, elapsed)
            .with_link("conversation", &conversation_link)
            .with_link("versions", &versions_link),
    ))
}
