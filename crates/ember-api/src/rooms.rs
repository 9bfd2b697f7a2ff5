use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use ember_types::api::{CreateRoomRequest, JoinRoomRequest};
use ember_types::events::RoomEvent;

use crate::auth::SessionToken;
use crate::error::ApiError;
use crate::state::AppState;

/// The `{room}` path segment carries a room id (uuid) on message and
/// subscribe routes. Anything that does not parse names no room.
pub(crate) fn parse_room_id(segment: &str) -> Result<Uuid, ApiError> {
    segment.parse().map_err(|_| ApiError::not_found())
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = state.rooms.clone();
    let ticket = tokio::task::spawn_blocking(move || rooms.create(req.duration_minutes))
        .await
        .map_err(ApiError::task)??;

    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn join_room(
    State(state): State<AppState>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = state.rooms.clone();
    let ticket = tokio::task::spawn_blocking(move || rooms.join(&req.code))
        .await
        .map_err(ApiError::task)??;

    // Tell the waiting creator their peer arrived
    state
        .dispatcher
        .publish(
            ticket.room.id,
            RoomEvent::PeerJoined {
                room: ticket.room.clone(),
            },
        )
        .await;

    Ok(Json(ticket))
}

/// Snapshot by code, for status polling. The code doubles as the lookup
/// key here because the joining side knows nothing else yet.
pub async fn get_room(
    State(state): State<AppState>,
    Path(room): Path<String>,
    SessionToken(token): SessionToken,
) -> Result<impl IntoResponse, ApiError> {
    let rooms = state.rooms.clone();
    let snapshot = tokio::task::spawn_blocking(move || rooms.get(&room, &token))
        .await
        .map_err(ApiError::task)??;

    Ok(Json(snapshot))
}
