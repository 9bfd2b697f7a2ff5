use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle states of a room.
///
/// `waiting` = one bound participant, `active` = both slots bound,
/// `expired` = past its deadline. Expired rooms are physically purged one
/// retention window after `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
    Expired,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown room status: {0}")]
pub struct ParseRoomStatusError(String);

impl FromStr for RoomStatus {
    type Err = ParseRoomStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            other => Err(ParseRoomStatusError(other.to_string())),
        }
    }
}

/// A two-party ephemeral room.
///
/// `participant_count` always equals the number of live participant
/// bindings (1 while waiting, 2 once active).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub code: String,
    pub duration_minutes: u32,
    pub status: RoomStatus,
    pub participant_count: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Room {
    /// Whether the deadline has passed, regardless of whether the expiry
    /// sweep has caught up with this room yet.
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// What a message payload contains. The relay treats every kind the same:
/// the payload is opaque ciphertext either way. `payment_*` kinds pass
/// through for the wallet feature, which lives entirely outside this
/// system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MessageKind {
    Text,
    Image,
    Payment(String),
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Image => f.write_str("image"),
            Self::Payment(suffix) => write!(f, "payment_{suffix}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown message kind: {0}")]
pub struct ParseMessageKindError(String);

impl FromStr for MessageKind {
    type Err = ParseMessageKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            other => {
                let suffix = other
                    .strip_prefix("payment_")
                    .filter(|rest| {
                        !rest.is_empty()
                            && rest.chars().all(|c| c.is_ascii_lowercase() || c == '_')
                    })
                    .ok_or_else(|| ParseMessageKindError(other.to_string()))?;
                Ok(Self::Payment(suffix.to_string()))
            }
        }
    }
}

impl TryFrom<String> for MessageKind {
    type Error = ParseMessageKindError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.to_string()
    }
}

/// A relayed message. Payloads are always encrypted client-side; the
/// server only ever sees ciphertext.
///
/// `seq` is the server insertion sequence; together with the
/// server-assigned `created_at` it defines the authoritative ordering
/// `(created_at, seq)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: Uuid,
    pub seq: i64,
    pub sender_slot: u8,
    pub kind: MessageKind,
    pub cipher_payload: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_status_round_trips_through_str() {
        for status in [RoomStatus::Waiting, RoomStatus::Active, RoomStatus::Expired] {
            assert_eq!(status.as_str().parse::<RoomStatus>().unwrap(), status);
        }
        assert!("gone".parse::<RoomStatus>().is_err());
    }

    #[test]
    fn message_kind_parses_known_kinds() {
        assert_eq!("text".parse::<MessageKind>().unwrap(), MessageKind::Text);
        assert_eq!("image".parse::<MessageKind>().unwrap(), MessageKind::Image);
        assert_eq!(
            "payment_request".parse::<MessageKind>().unwrap(),
            MessageKind::Payment("request".to_string())
        );
    }

    #[test]
    fn message_kind_rejects_garbage() {
        assert!("video".parse::<MessageKind>().is_err());
        assert!("payment_".parse::<MessageKind>().is_err());
        assert!("payment_UPPER".parse::<MessageKind>().is_err());
        assert!("payment_123".parse::<MessageKind>().is_err());
    }

    #[test]
    fn message_kind_displays_as_wire_string() {
        assert_eq!(MessageKind::Text.to_string(), "text");
        assert_eq!(
            MessageKind::Payment("sent".to_string()).to_string(),
            "payment_sent"
        );
    }
}
