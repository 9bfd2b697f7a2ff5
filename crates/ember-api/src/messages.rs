use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;

use ember_types::api::{MessageResponse, SendMessageRequest};
use ember_types::events::RoomEvent;

use crate::auth::SessionToken;
use crate::error::ApiError;
use crate::rooms::parse_room_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Exclusive cursor: return messages after this `seq`.
    pub after: Option<i64>,
    pub limit: Option<u32>,
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(room): Path<String>,
    SessionToken(token): SessionToken,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = parse_room_id(&room)?;
    let payload = B64
        .decode(&req.ciphertext)
        .map_err(|_| ApiError::bad_request("invalid_ciphertext", "ciphertext must be base64"))?;

    // Run the blocking store write off the async runtime
    let rooms = state.rooms.clone();
    let message = tokio::task::spawn_blocking(move || {
        rooms.post_message(&room_id, &token, &req.kind, payload)
    })
    .await
    .map_err(ApiError::task)??;

    let response = MessageResponse::from(message);
    state
        .dispatcher
        .publish(
            room_id,
            RoomEvent::MessageCreated {
                message: response.clone(),
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(room): Path<String>,
    SessionToken(token): SessionToken,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = parse_room_id(&room)?;

    let rooms = state.rooms.clone();
    let messages = tokio::task::spawn_blocking(move || {
        rooms.messages(&room_id, &token, query.after, query.limit)
    })
    .await
    .map_err(ApiError::task)??;

    let messages: Vec<MessageResponse> = messages.into_iter().map(MessageResponse::from).collect();
    Ok(Json(messages))
}
