use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use ember_types::events::RoomEvent;

/// Capacity of each room's event channel.
const EVENT_BUFFER: usize = 256;

/// Fans relay events out to every socket subscribed to a room.
///
/// Channels are created on first subscribe and torn down by
/// [`Dispatcher::close_room`] or when the last subscriber goes away.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Per-room broadcast senders: room_id -> sender
    rooms: RwLock<HashMap<Uuid, broadcast::Sender<RoomEvent>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                rooms: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Subscribe to a room's events, creating its channel if this is the
    /// first subscriber.
    pub async fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<RoomEvent> {
        let mut rooms = self.inner.rooms.write().await;
        rooms
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(EVENT_BUFFER).0)
            .subscribe()
    }

    /// Publish an event to a room's subscribers. A room nobody is
    /// listening to is a no-op.
    pub async fn publish(&self, room_id: Uuid, event: RoomEvent) {
        let rooms = self.inner.rooms.read().await;
        if let Some(tx) = rooms.get(&room_id) {
            let _ = tx.send(event);
        }
    }

    /// Announce the close and drop the room's channel. Subscribers drain
    /// the `RoomClosed` event and then see their stream end.
    pub async fn close_room(&self, room_id: Uuid) {
        let mut rooms = self.inner.rooms.write().await;
        if let Some(tx) = rooms.remove(&room_id) {
            let _ = tx.send(RoomEvent::RoomClosed);
        }
    }

    /// Drop a room's channel if it has no live subscribers. Called on
    /// connection teardown so idle channels don't accumulate.
    pub async fn prune_if_idle(&self, room_id: Uuid) {
        let mut rooms = self.inner.rooms.write().await;
        if rooms
            .get(&room_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            rooms.remove(&room_id);
        }
    }

    /// Live subscriber count for a room.
    pub async fn subscriber_count(&self, room_id: Uuid) -> usize {
        let rooms = self.inner.rooms.read().await;
        rooms.get(&room_id).map_or(0, |tx| tx.receiver_count())
    }

    /// Number of rooms with an open channel.
    pub async fn room_count(&self) -> usize {
        self.inner.rooms.read().await.len()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
