//! Database row types, mapping directly to SQLite rows. Timestamps are
//! unix milliseconds. Distinct from the ember-types API models so the DB
//! layer stays independent of wire concerns.

#[derive(Debug, Clone)]
pub struct RoomRow {
    pub id: String,
    pub code: String,
    pub duration_minutes: i64,
    pub status: String,
    pub participant_count: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct ParticipantRow {
    pub token: String,
    pub room_id: String,
    pub slot: i64,
    pub created_at: i64,
}

/// Note: `sender_token` never leaves the store; rows expose only the
/// non-secret `sender_slot`.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub seq: i64,
    pub id: String,
    pub room_id: String,
    pub sender_slot: i64,
    pub kind: String,
    pub cipher_payload: Vec<u8>,
    pub created_at: i64,
}
