use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use ember_types::events::RoomEvent;
use ember_types::models::Room;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Drive one subscribed socket.
///
/// The session token was already checked at the HTTP upgrade, so the
/// socket opens straight with `Ready` carrying a room snapshot, then
/// relays room events until the room closes, the peer hangs up, or the
/// heartbeat gives out.
pub async fn serve_room_socket(socket: WebSocket, dispatcher: Dispatcher, room: Room) {
    let room_id = room.id;
    let (mut sender, mut receiver) = socket.split();

    info!(room_id = %room_id, "socket subscribed");

    let Some(ready) = encode(&RoomEvent::Ready { room }) else {
        return;
    };
    if sender.send(Message::Text(ready.into())).await.is_err() {
        return;
    }

    let mut events = dispatcher.subscribe(room_id).await;

    // Shared flag for heartbeat
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward room events to the client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = events.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(room_id = %room_id, lagged = n, "event receiver lagged, continuing");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };

                    let closing = matches!(event, RoomEvent::RoomClosed);
                    let Some(text) = encode(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                    if closing {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!(room_id = %room_id, "heartbeat timeout, dropping socket");
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Drain client frames. The event socket is one-way: messages travel
    // over HTTP, so anything except Pong/Close is ignored.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                Message::Text(_) | Message::Binary(_) => {
                    debug!(room_id = %room_id, "ignoring inbound frame on event socket");
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.prune_if_idle(room_id).await;
    info!(room_id = %room_id, "socket disconnected");
}

fn encode(event: &RoomEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(error = %err, "failed to encode room event");
            None
        }
    }
}
