//! Room lifecycle and message relay.
//!
//! Everything here runs server-side against the store; the payloads that
//! pass through are opaque ciphertext. The [`Rooms`] handle is the single
//! entry point: create/join/get drive the room state machine, post/fetch
//! relay messages, and `sweep` retires rooms past their deadline.

pub mod codes;
mod convert;
pub mod error;
mod lifecycle;
mod relay;

pub use error::RoomError;
pub use lifecycle::{Rooms, SweepReport};

/// Allowed room lifetime bounds, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 1;
pub const MAX_DURATION_MINUTES: u32 = 120;

/// How long an expired room's ciphertext stays fetchable before the purge
/// removes the room and everything bound to it.
pub const RETENTION_MS: i64 = 60 * 60 * 1000;

/// Upper bound on a single stored cipher payload.
pub const MAX_PAYLOAD_BYTES: usize = 512 * 1024;

/// Page cap for history fetches.
pub const MAX_MESSAGE_PAGE: u32 = 500;
