use rusqlite::{Connection, OptionalExtension, params};

use crate::Database;
use crate::StoreError;
use crate::models::{MessageRow, ParticipantRow, RoomRow};

impl Database {
    // -- Rooms --

    /// Raw room insert. Production code goes through
    /// [`Database::create_room_with_creator`]; this exists for scenario
    /// setup (e.g. back-dated rooms in tests).
    pub fn insert_room(
        &self,
        id: &str,
        code: &str,
        duration_minutes: i64,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO rooms (id, code, duration_minutes, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, code, duration_minutes, created_at, expires_at],
            )
            .map_err(StoreError::from_insert)?;
            Ok(())
        })
    }

    /// Insert a room and its slot-1 creator binding in one transaction, so
    /// no observer ever sees a room with zero bindings.
    pub fn create_room_with_creator(
        &self,
        id: &str,
        code: &str,
        duration_minutes: i64,
        token: &str,
        created_at: i64,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO rooms (id, code, duration_minutes, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, code, duration_minutes, created_at, expires_at],
            )
            .map_err(StoreError::from_insert)?;

            tx.execute(
                "INSERT INTO participants (token, room_id, slot, created_at)
                 VALUES (?1, ?2, 1, ?3)",
                params![token, id, created_at],
            )
            .map_err(StoreError::from_insert)?;

            tx.commit()?;
            Ok(())
        })
    }

    pub fn find_room(&self, id: &str) -> Result<RoomRow, StoreError> {
        self.with_conn(|conn| query_room(conn, "id", id)?.ok_or(StoreError::NotFound))
    }

    pub fn find_room_by_code(&self, code: &str) -> Result<RoomRow, StoreError> {
        self.with_conn(|conn| query_room(conn, "code", code)?.ok_or(StoreError::NotFound))
    }

    /// Bind the slot-2 joiner and flip the room `waiting -> active`, all in
    /// one transaction. The conditional UPDATE is the authoritative gate
    /// against concurrent joins: it succeeds only from the expected prior
    /// state and re-checks that the live binding count matches. On any
    /// failure the transaction rolls back, so a losing join never leaves an
    /// orphaned binding behind.
    pub fn join_room(&self, room_id: &str, token: &str, now: i64) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let state: Option<(String, i64)> = tx
                .query_row(
                    "SELECT status, participant_count FROM rooms WHERE id = ?1",
                    [room_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let (status, count) = state.ok_or(StoreError::NotFound)?;
            if status != "waiting" || count != 1 {
                return Err(StoreError::StaleState);
            }

            tx.execute(
                "INSERT INTO participants (token, room_id, slot, created_at)
                 VALUES (?1, ?2, 2, ?3)",
                params![token, room_id, now],
            )
            .map_err(StoreError::from_insert)?;

            let changed = tx.execute(
                "UPDATE rooms SET status = 'active', participant_count = 2
                  WHERE id = ?1 AND status = 'waiting' AND participant_count = 1
                    AND (SELECT COUNT(*) FROM participants WHERE room_id = ?1) = 2",
                [room_id],
            )?;
            if changed != 1 {
                return Err(StoreError::StaleState);
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Idempotent: marking an already-expired room changes nothing.
    pub fn mark_expired(&self, room_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE rooms SET status = 'expired' WHERE id = ?1 AND status != 'expired'",
                [room_id],
            )?;
            Ok(())
        })
    }

    /// Cascade-deletes the room's participants and messages with it.
    /// Idempotent: purging a purged room is a no-op.
    pub fn purge_room(&self, room_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM rooms WHERE id = ?1", [room_id])?;
            Ok(())
        })
    }

    /// Rooms past their deadline that the sweep has not marked yet.
    pub fn expired_candidates(&self, now: i64) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| query_ids(
            conn,
            "SELECT id FROM rooms WHERE expires_at < ?1 AND status != 'expired'",
            now,
        ))
    }

    /// Rooms whose retention window has fully elapsed (`cutoff` is
    /// `now - retention`).
    pub fn purge_candidates(&self, cutoff: i64) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| query_ids(conn, "SELECT id FROM rooms WHERE expires_at < ?1", cutoff))
    }

    // -- Participants --

    pub fn insert_participant(
        &self,
        room_id: &str,
        token: &str,
        slot: i64,
        created_at: i64,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO participants (token, room_id, slot, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token, room_id, slot, created_at],
            )
            .map_err(StoreError::from_insert)?;
            Ok(())
        })
    }

    /// The authorization lookup: a token is valid only for its own room.
    pub fn find_participant(
        &self,
        room_id: &str,
        token: &str,
    ) -> Result<ParticipantRow, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT token, room_id, slot, created_at
                 FROM participants WHERE room_id = ?1 AND token = ?2",
                params![room_id, token],
                map_participant_row,
            )
            .optional()?
            .ok_or(StoreError::Unauthorized)
        })
    }

    pub fn list_participants(&self, room_id: &str) -> Result<Vec<ParticipantRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT token, room_id, slot, created_at
                 FROM participants WHERE room_id = ?1 ORDER BY slot",
            )?;
            let rows = stmt
                .query_map([room_id], map_participant_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Messages --

    /// Persist a message, verifying in the same transaction that the
    /// sender's binding is still live. `created_at` is the server-assigned
    /// ordering key; the returned row carries the assigned `seq`.
    pub fn insert_message(
        &self,
        id: &str,
        room_id: &str,
        sender_token: &str,
        kind: &str,
        cipher_payload: &[u8],
        created_at: i64,
    ) -> Result<MessageRow, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let slot: Option<i64> = tx
                .query_row(
                    "SELECT slot FROM participants WHERE room_id = ?1 AND token = ?2",
                    params![room_id, sender_token],
                    |row| row.get(0),
                )
                .optional()?;
            let slot = slot.ok_or(StoreError::Unauthorized)?;

            tx.execute(
                "INSERT INTO messages (id, room_id, sender_token, sender_slot, kind, cipher_payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, room_id, sender_token, slot, kind, cipher_payload, created_at],
            )
            .map_err(StoreError::from_insert)?;

            let seq = tx.last_insert_rowid();
            tx.commit()?;

            Ok(MessageRow {
                seq,
                id: id.to_string(),
                room_id: room_id.to_string(),
                sender_slot: slot,
                kind: kind.to_string(),
                cipher_payload: cipher_payload.to_vec(),
                created_at,
            })
        })
    }

    /// Messages in authoritative order: server-assigned `created_at`
    /// ascending, insertion `seq` as the tie-break. `after_seq` is an
    /// exclusive cursor for incremental rehydration.
    pub fn list_messages(
        &self,
        room_id: &str,
        after_seq: Option<i64>,
        limit: u32,
    ) -> Result<Vec<MessageRow>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, id, room_id, sender_slot, kind, cipher_payload, created_at
                 FROM messages
                 WHERE room_id = ?1 AND seq > ?2
                 ORDER BY created_at ASC, seq ASC
                 LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(
                    params![room_id, after_seq.unwrap_or(-1), limit],
                    |row| {
                        Ok(MessageRow {
                            seq: row.get(0)?,
                            id: row.get(1)?,
                            room_id: row.get(2)?,
                            sender_slot: row.get(3)?,
                            kind: row.get(4)?,
                            cipher_payload: row.get(5)?,
                            created_at: row.get(6)?,
                        })
                    },
                )?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_room(conn: &Connection, column: &str, value: &str) -> Result<Option<RoomRow>, StoreError> {
    // `column` is a compile-time constant at every call site, never input
    let sql = format!(
        "SELECT id, code, duration_minutes, status, participant_count, created_at, expires_at
         FROM rooms WHERE {column} = ?1"
    );
    let row = conn
        .query_row(&sql, [value], |row| {
            Ok(RoomRow {
                id: row.get(0)?,
                code: row.get(1)?,
                duration_minutes: row.get(2)?,
                status: row.get(3)?,
                participant_count: row.get(4)?,
                created_at: row.get(5)?,
                expires_at: row.get(6)?,
            })
        })
        .optional()?;
    Ok(row)
}

fn query_ids(conn: &Connection, sql: &str, bound: i64) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([bound], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn map_participant_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ParticipantRow> {
    Ok(ParticipantRow {
        token: row.get(0)?,
        room_id: row.get(1)?,
        slot: row.get(2)?,
        created_at: row.get(3)?,
    })
}
