use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use ember_types::models::{Message, MessageKind};

use crate::convert::message_from_row;
use crate::error::RoomError;
use crate::lifecycle::Rooms;
use crate::{MAX_MESSAGE_PAGE, MAX_PAYLOAD_BYTES};

impl Rooms {
    /// Persist a cipher payload and return the stored message with its
    /// server-assigned ordering keys. The relay never inspects the
    /// payload; a waiting room accepts messages so the creator can type
    /// ahead, an expired one refuses them. `kind` arrives in wire form
    /// and is validated here.
    pub fn post_message(
        &self,
        room_id: &Uuid,
        token: &str,
        kind: &str,
        cipher_payload: Vec<u8>,
    ) -> Result<Message, RoomError> {
        self.authorize_live(room_id, token)?;
        let kind: MessageKind = kind.parse().map_err(|_| RoomError::InvalidKind)?;
        if cipher_payload.len() > MAX_PAYLOAD_BYTES {
            return Err(RoomError::PayloadTooLarge);
        }

        let id = Uuid::new_v4();
        let row = self.db.insert_message(
            &id.to_string(),
            &room_id.to_string(),
            token,
            &kind.to_string(),
            &cipher_payload,
            Utc::now().timestamp_millis(),
        )?;
        debug!(room_id = %room_id, seq = row.seq, "message stored");
        Ok(message_from_row(row)?)
    }

    /// History fetch in authoritative order `(created_at, seq)`.
    ///
    /// Reads stay allowed after expiry so a reconnecting client can
    /// rehydrate until the purge removes the room.
    pub fn messages(
        &self,
        room_id: &Uuid,
        token: &str,
        after_seq: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RoomError> {
        self.authorize(room_id, token)?;
        let limit = limit.unwrap_or(MAX_MESSAGE_PAGE).min(MAX_MESSAGE_PAGE);
        let rows = self.db.list_messages(&room_id.to_string(), after_seq, limit)?;
        rows.into_iter()
            .map(|row| message_from_row(row).map_err(RoomError::from))
            .collect()
    }
}
