use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS rooms (
            id                TEXT PRIMARY KEY,
            code              TEXT NOT NULL UNIQUE,
            duration_minutes  INTEGER NOT NULL,
            status            TEXT NOT NULL DEFAULT 'waiting'
                              CHECK (status IN ('waiting', 'active', 'expired')),
            participant_count INTEGER NOT NULL DEFAULT 1
                              CHECK (participant_count IN (1, 2)),
            created_at        INTEGER NOT NULL,
            expires_at        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_rooms_expires
            ON rooms(expires_at);

        CREATE TABLE IF NOT EXISTS participants (
            token       TEXT PRIMARY KEY,
            room_id     TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            slot        INTEGER NOT NULL CHECK (slot IN (1, 2)),
            created_at  INTEGER NOT NULL,
            UNIQUE(room_id, slot)
        );

        CREATE INDEX IF NOT EXISTS idx_participants_room
            ON participants(room_id);

        CREATE TABLE IF NOT EXISTS messages (
            seq            INTEGER PRIMARY KEY AUTOINCREMENT,
            id             TEXT NOT NULL UNIQUE,
            room_id        TEXT NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
            sender_token   TEXT NOT NULL REFERENCES participants(token) ON DELETE CASCADE,
            sender_slot    INTEGER NOT NULL CHECK (sender_slot IN (1, 2)),
            kind           TEXT NOT NULL,
            cipher_payload BLOB NOT NULL,
            created_at     INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_room
            ON messages(room_id, created_at, seq);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
