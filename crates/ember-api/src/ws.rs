use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::IntoResponse,
};
use serde::Deserialize;

use ember_gateway::connection;

use crate::error::ApiError;
use crate::rooms::parse_room_id;
use crate::state::AppState;

/// Browsers cannot set headers on a WebSocket handshake, so the session
/// token rides a query parameter on this one route.
#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    pub token: String,
}

/// Authorize once, then upgrade. Everything after the handshake is the
/// gateway's connection loop; no further token checks happen on the
/// stream.
pub async fn subscribe(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(params): Query<SubscribeParams>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = parse_room_id(&room)?;

    // History stays fetchable until the purge, but there is nothing left
    // to stream from a dead room, so this wants the live check.
    let rooms = state.rooms.clone();
    let (snapshot, _slot) =
        tokio::task::spawn_blocking(move || rooms.authorize_live(&room_id, &params.token))
            .await
            .map_err(ApiError::task)??;

    let dispatcher = state.dispatcher.clone();
    Ok(ws.on_upgrade(move |socket| connection::serve_room_socket(socket, dispatcher, snapshot)))
}
