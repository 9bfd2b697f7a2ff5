use serde::{Deserialize, Serialize};

use crate::api::MessageResponse;
use crate::models::Room;

/// Events delivered over a room's WebSocket stream.
///
/// A subscriber is authorized once at upgrade time; after that the stream
/// carries new messages and room status transitions until the connection
/// closes or the room is destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RoomEvent {
    /// Sent once, immediately after the upgrade: a snapshot of the room so
    /// reconnecting clients resync status without a second fetch.
    Ready { room: Room },

    /// A new encrypted message was accepted by the relay.
    MessageCreated { message: MessageResponse },

    /// The second participant joined; the room is now active.
    PeerJoined { room: Room },

    /// The room expired (or was purged). No further events will arrive and
    /// every subsequent call for this room fails.
    RoomClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomStatus;
    use uuid::Uuid;

    fn sample_room() -> Room {
        Room {
            id: Uuid::new_v4(),
            code: "ABCDEF".to_string(),
            duration_minutes: 5,
            status: RoomStatus::Active,
            participant_count: 2,
            created_at: chrono::Utc::now(),
            expires_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = RoomEvent::PeerJoined { room: sample_room() };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"PeerJoined\""));
        let back: RoomEvent = serde_json::from_str(&json).unwrap();
        match back {
            RoomEvent::PeerJoined { room } => assert_eq!(room.status, RoomStatus::Active),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn room_closed_serializes_without_payload() {
        let json = serde_json::to_string(&RoomEvent::RoomClosed).unwrap();
        assert_eq!(json, "{\"type\":\"RoomClosed\"}");
        let back: RoomEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, RoomEvent::RoomClosed));
    }
}
