//! Row-to-domain conversion. A row that fails to convert means the store
//! holds something the schema should have made impossible, so every
//! failure here is reported as corruption.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ember_db::StoreError;
use ember_db::models::{MessageRow, RoomRow};
use ember_types::models::{Message, MessageKind, Room, RoomStatus};

pub(crate) fn room_from_row(row: RoomRow) -> Result<Room, StoreError> {
    Ok(Room {
        id: parse_uuid(&row.id)?,
        code: row.code,
        duration_minutes: int_field(row.duration_minutes, "duration_minutes")?,
        status: row.status.parse::<RoomStatus>().map_err(corrupt)?,
        participant_count: int_field(row.participant_count, "participant_count")?,
        created_at: timestamp(row.created_at)?,
        expires_at: timestamp(row.expires_at)?,
    })
}

pub(crate) fn message_from_row(row: MessageRow) -> Result<Message, StoreError> {
    Ok(Message {
        id: parse_uuid(&row.id)?,
        room_id: parse_uuid(&row.room_id)?,
        seq: row.seq,
        sender_slot: int_field(row.sender_slot, "sender_slot")?,
        kind: row.kind.parse::<MessageKind>().map_err(corrupt)?,
        cipher_payload: row.cipher_payload,
        created_at: timestamp(row.created_at)?,
    })
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, StoreError> {
    s.parse()
        .map_err(|_| StoreError::Corrupt(format!("bad uuid: {s}")))
}

pub(crate) fn int_field<T: TryFrom<i64>>(value: i64, field: &str) -> Result<T, StoreError> {
    T::try_from(value).map_err(|_| StoreError::Corrupt(format!("{field} out of range: {value}")))
}

fn timestamp(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {ms}")))
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}
