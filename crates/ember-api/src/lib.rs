//! HTTP surface of the relay.
//!
//! Thin handlers over [`ember_rooms::Rooms`]: each one authorizes,
//! delegates to the blocking store off the async runtime, publishes any
//! resulting live event, and shapes the response. Route layout:
//!
//! ```text
//! POST /rooms                     create a room
//! POST /rooms/join                join by code
//! GET  /rooms/{room}              room snapshot (by code)
//! POST /rooms/{room}/messages     relay a ciphertext (by room id)
//! GET  /rooms/{room}/messages     fetch history (by room id)
//! GET  /rooms/{room}/subscribe    WebSocket event stream (by room id)
//! ```

pub mod auth;
pub mod error;
pub mod messages;
pub mod rooms;
pub mod state;
pub mod ws;

#[cfg(test)]
mod tests;

use axum::Router;
use axum::routing::{get, post};

pub use error::ApiError;
pub use state::{AppState, AppStateInner};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/rooms", post(rooms::create_room))
        .route("/rooms/join", post(rooms::join_room))
        .route("/rooms/{room}", get(rooms::get_room))
        .route(
            "/rooms/{room}/messages",
            post(messages::send_message).get(messages::get_messages),
        )
        .route("/rooms/{room}/subscribe", get(ws::subscribe))
        .with_state(state)
}
