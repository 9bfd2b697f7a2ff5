use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, MessageKind, Room};

// -- Rooms --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRoomRequest {
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JoinRoomRequest {
    pub code: String,
}

/// Returned by both create and join: the room plus the capability token
/// that authorizes every later call for this participant's slot.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomTicket {
    pub room: Room,
    pub session_token: String,
    pub slot: u8,
}

// -- Messages --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    /// Wire form of [`MessageKind`]; kept as a string here so the server
    /// can reject unknown kinds with a validation error instead of a
    /// deserialization failure.
    pub kind: String,
    /// Base64 of `nonce || ciphertext+tag` produced client-side.
    pub ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub room_id: Uuid,
    pub seq: i64,
    pub sender_slot: u8,
    pub kind: MessageKind,
    /// Base64 of the stored cipher payload. Never plaintext.
    pub ciphertext: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            room_id: m.room_id,
            seq: m.seq,
            sender_slot: m.sender_slot,
            kind: m.kind,
            ciphertext: B64.encode(&m.cipher_payload),
            created_at: m.created_at,
        }
    }
}

// -- Errors --

/// Body shape of every non-2xx response. `error` is a stable machine
/// code; `message` stays terse and reveals nothing about room state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
