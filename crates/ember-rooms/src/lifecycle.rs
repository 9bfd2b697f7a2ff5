use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use ember_crypto::token::issue_session_token;
use ember_db::{Database, StoreError};
use ember_types::api::RoomTicket;
use ember_types::models::{Room, RoomStatus};

use crate::codes;
use crate::convert::{int_field, parse_uuid, room_from_row};
use crate::error::RoomError;
use crate::{MAX_DURATION_MINUTES, MIN_DURATION_MINUTES, RETENTION_MS};

/// How many candidate codes `create` tries before reporting exhaustion.
const CODE_RETRY_LIMIT: u32 = 5;

/// Room lifecycle operations. Cheap to clone; all state lives in the
/// store, so any number of handles may run concurrently.
#[derive(Clone)]
pub struct Rooms {
    pub(crate) db: Arc<Database>,
}

/// What one sweep pass did: rooms newly marked expired, and rooms purged
/// because their retention window elapsed too.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub expired: Vec<Uuid>,
    pub purged: Vec<Uuid>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.purged.is_empty()
    }
}

impl Rooms {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a room and bind its creator to slot 1, in one transaction.
    ///
    /// Code collisions stay internal: the create retries with a fresh code
    /// and a fresh token until the insert lands or the retry budget runs
    /// out.
    pub fn create(&self, duration_minutes: u32) -> Result<RoomTicket, RoomError> {
        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration_minutes) {
            return Err(RoomError::InvalidDuration);
        }

        for attempt in 1..=CODE_RETRY_LIMIT {
            let id = Uuid::new_v4();
            let code = codes::generate_code();
            let token = issue_session_token();
            let now_ms = Utc::now().timestamp_millis();
            let expires_ms = now_ms + i64::from(duration_minutes) * 60_000;

            match self.db.create_room_with_creator(
                &id.to_string(),
                &code,
                i64::from(duration_minutes),
                &token,
                now_ms,
                expires_ms,
            ) {
                Ok(()) => {
                    info!(room_id = %id, code, duration_minutes, "room created");
                    let room = room_from_row(self.db.find_room(&id.to_string())?)?;
                    return Ok(RoomTicket {
                        room,
                        session_token: token,
                        slot: 1,
                    });
                }
                Err(StoreError::Conflict) => {
                    debug!(attempt, "room code collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(RoomError::CodesExhausted)
    }

    /// Join a waiting room by its code, binding slot 2 and flipping the
    /// room active. The store's compare-and-swap is the authoritative
    /// gate; the status check beforehand only short-circuits the obvious
    /// refusals.
    pub fn join(&self, code: &str) -> Result<RoomTicket, RoomError> {
        let code = codes::normalize_code(code);
        if !codes::is_valid_code(&code) {
            return Err(RoomError::NotFound);
        }

        let room = self.fresh_room_by_code(&code)?;
        match room.status {
            RoomStatus::Expired => return Err(RoomError::Expired),
            RoomStatus::Active => return Err(RoomError::RoomFull),
            RoomStatus::Waiting => {}
        }

        let token = issue_session_token();
        let now = Utc::now();
        match self
            .db
            .join_room(&room.id.to_string(), &token, now.timestamp_millis())
        {
            Ok(()) => {}
            Err(StoreError::StaleState) => {
                // Lost the race. Re-read to tell a second joiner beating us
                // apart from the room expiring underneath us.
                let room = self.fresh_room(&room.id)?;
                return Err(if room.status == RoomStatus::Expired {
                    RoomError::Expired
                } else {
                    RoomError::RoomFull
                });
            }
            Err(err) => return Err(err.into()),
        }

        let room = self.fresh_room(&room.id)?;
        info!(room_id = %room.id, "participant joined, room active");
        Ok(RoomTicket {
            room,
            session_token: token,
            slot: 2,
        })
    }

    /// Room snapshot for an authorized participant. Reflects lazy expiry,
    /// so a client polling this sees `expired` as soon as the deadline
    /// passes, whether or not the sweep has run.
    pub fn get(&self, code: &str, token: &str) -> Result<Room, RoomError> {
        let code = codes::normalize_code(code);
        let mut room = room_from_row(self.db.find_room_by_code(&code)?)?;
        self.db.find_participant(&room.id.to_string(), token)?;
        self.apply_lazy_expiry(&mut room)?;
        Ok(room)
    }

    /// Check a (room, token) pair and return the room with the caller's
    /// slot. Room-first: a purged room reports `NotFound` before the token
    /// is ever considered, so a stale token learns nothing.
    pub fn authorize(&self, room_id: &Uuid, token: &str) -> Result<(Room, u8), RoomError> {
        let mut room = room_from_row(self.db.find_room(&room_id.to_string())?)?;
        let binding = self.db.find_participant(&room_id.to_string(), token)?;
        self.apply_lazy_expiry(&mut room)?;
        let slot = int_field(binding.slot, "slot")?;
        Ok((room, slot))
    }

    /// [`authorize`], restricted to rooms that can still carry new
    /// traffic. An expired room fails `RoomClosed` here even though its
    /// history stays readable until the purge.
    ///
    /// [`authorize`]: Rooms::authorize
    pub fn authorize_live(&self, room_id: &Uuid, token: &str) -> Result<(Room, u8), RoomError> {
        let (room, slot) = self.authorize(room_id, token)?;
        if room.status == RoomStatus::Expired {
            return Err(RoomError::RoomClosed);
        }
        Ok((room, slot))
    }

    /// One maintenance pass: mark rooms past their deadline, then purge
    /// rooms whose retention window has also elapsed. Every step is
    /// idempotent, so overlapping sweeps are harmless.
    pub fn sweep(&self) -> Result<SweepReport, RoomError> {
        let now_ms = Utc::now().timestamp_millis();
        let mut report = SweepReport::default();

        for id in self.db.expired_candidates(now_ms)? {
            self.db.mark_expired(&id)?;
            report.expired.push(parse_uuid(&id)?);
        }
        for id in self.db.purge_candidates(now_ms - RETENTION_MS)? {
            self.db.purge_room(&id)?;
            report.purged.push(parse_uuid(&id)?);
        }

        if !report.is_empty() {
            info!(
                expired = report.expired.len(),
                purged = report.purged.len(),
                "sweep pass"
            );
        }
        Ok(report)
    }

    fn fresh_room(&self, id: &Uuid) -> Result<Room, RoomError> {
        let mut room = room_from_row(self.db.find_room(&id.to_string())?)?;
        self.apply_lazy_expiry(&mut room)?;
        Ok(room)
    }

    fn fresh_room_by_code(&self, code: &str) -> Result<Room, RoomError> {
        let mut room = room_from_row(self.db.find_room_by_code(code)?)?;
        self.apply_lazy_expiry(&mut room)?;
        Ok(room)
    }

    /// A room past its deadline is marked expired on first observation
    /// rather than waiting for the sweep to reach it.
    fn apply_lazy_expiry(&self, room: &mut Room) -> Result<(), RoomError> {
        if room.status != RoomStatus::Expired && room.is_past_deadline(Utc::now()) {
            self.db.mark_expired(&room.id.to_string())?;
            room.status = RoomStatus::Expired;
            debug!(room_id = %room.id, "room lazily marked expired");
        }
        Ok(())
    }
}
