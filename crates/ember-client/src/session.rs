use ember_crypto::{DECRYPT_SENTINEL, RoomKey, decode_blob, decrypt, derive_room_key, encode_blob, encrypt};
use ember_types::api::{MessageResponse, RoomTicket, SendMessageRequest};
use ember_types::models::{MessageKind, Room};
use uuid::Uuid;

use crate::error::ClientError;
use crate::timeline::DecryptedMessage;

/// One participant's end of a room: the ticket's credentials plus the
/// key derived from the room code.
///
/// Nothing here is process-global, so a front end can hold sessions for
/// several rooms at once. [`close`] destroys the key; the metadata
/// survives so the UI can still label the dead conversation.
///
/// [`close`]: RoomSession::close
pub struct RoomSession {
    room: Room,
    session_token: String,
    slot: u8,
    key: Option<RoomKey>,
}

impl RoomSession {
    /// Build a session from a create or join ticket, deriving the room
    /// key from the code the ticket carries.
    pub fn establish(ticket: RoomTicket) -> Self {
        let key = derive_room_key(&ticket.room.code);
        Self {
            room: ticket.room,
            session_token: ticket.session_token,
            slot: ticket.slot,
            key: Some(key),
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn room_id(&self) -> Uuid {
        self.room.id
    }

    pub fn code(&self) -> &str {
        &self.room.code
    }

    /// Bearer token for authenticated relay calls.
    pub fn token(&self) -> &str {
        &self.session_token
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn is_closed(&self) -> bool {
        self.key.is_none()
    }

    /// Replace the cached room snapshot after a fetch or a peer event.
    pub fn update_room(&mut self, room: Room) {
        self.room = room;
    }

    /// Seal a plaintext into a ready-to-send request body. Fails once
    /// the session is closed; the key is gone by then.
    pub fn encrypt_message(
        &self,
        kind: &MessageKind,
        plaintext: &[u8],
    ) -> Result<SendMessageRequest, ClientError> {
        let key = self.key.as_ref().ok_or(ClientError::SessionClosed)?;
        let blob = encrypt(key, plaintext)?;
        Ok(SendMessageRequest {
            kind: kind.to_string(),
            ciphertext: encode_blob(&blob),
        })
    }

    /// Open a relay message for display.
    ///
    /// Never fails: a payload that does not decode, verify, or parse as
    /// UTF-8 renders as [`DECRYPT_SENTINEL`], and the metadata is kept
    /// so the timeline entry still shows up in its slot.
    pub fn decrypt_message(&self, message: &MessageResponse) -> DecryptedMessage {
        DecryptedMessage {
            id: message.id,
            seq: message.seq,
            sender_slot: message.sender_slot,
            kind: message.kind.clone(),
            text: self.decrypt_text(&message.ciphertext),
            created_at: message.created_at,
        }
    }

    fn decrypt_text(&self, ciphertext: &str) -> String {
        let Some(key) = self.key.as_ref() else {
            return DECRYPT_SENTINEL.to_string();
        };
        let Ok(blob) = decode_blob(ciphertext) else {
            return DECRYPT_SENTINEL.to_string();
        };
        match decrypt(key, &blob) {
            Ok(bytes) => {
                String::from_utf8(bytes).unwrap_or_else(|_| DECRYPT_SENTINEL.to_string())
            }
            Err(_) => DECRYPT_SENTINEL.to_string(),
        }
    }

    /// Destroy the key material. Idempotent. Nothing can be sealed or
    /// opened afterwards; decryption renders the sentinel instead.
    pub fn close(&mut self) {
        self.key = None;
    }
}
