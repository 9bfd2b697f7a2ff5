//! HTTP and WebSocket plumbing for a live relay. Feature-gated so the
//! session and timeline layers stay runtime-free.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};
use uuid::Uuid;

use ember_types::api::{
    CreateRoomRequest, ErrorBody, JoinRoomRequest, MessageResponse, RoomTicket,
    SendMessageRequest,
};
use ember_types::events::RoomEvent;
use ember_types::models::Room;

use crate::error::ClientError;

/// HTTP half of the relay protocol. Cheap to clone; the inner reqwest
/// client pools connections.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// `base_url` is the relay origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn create_room(&self, duration_minutes: u32) -> Result<RoomTicket, ClientError> {
        let response = self
            .http
            .post(format!("{}/rooms", self.base_url))
            .json(&CreateRoomRequest { duration_minutes })
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn join_room(&self, code: &str) -> Result<RoomTicket, ClientError> {
        let response = self
            .http
            .post(format!("{}/rooms/join", self.base_url))
            .json(&JoinRoomRequest {
                code: code.to_string(),
            })
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_room(&self, code: &str, token: &str) -> Result<Room, ClientError> {
        let response = self
            .http
            .get(format!("{}/rooms/{}", self.base_url, code))
            .bearer_auth(token)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn send_message(
        &self,
        room_id: Uuid,
        token: &str,
        request: &SendMessageRequest,
    ) -> Result<MessageResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/rooms/{}/messages", self.base_url, room_id))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn get_messages(
        &self,
        room_id: Uuid,
        token: &str,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<MessageResponse>, ClientError> {
        let mut request = self
            .http
            .get(format!("{}/rooms/{}/messages", self.base_url, room_id))
            .bearer_auth(token);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", i64::from(limit))]);
        }
        Self::parse(request.send().await?).await
    }

    async fn parse<T>(response: reqwest::Response) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = match response.json::<ErrorBody>().await {
            Ok(body) => body,
            // Proxies and panics produce non-JSON bodies; keep the status.
            Err(_) => ErrorBody {
                error: "unknown".to_string(),
                message: format!("http status {status}"),
            },
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            code: body.error,
            message: body.message,
        })
    }
}

/// Live event stream for one room.
///
/// [`close`] (or drop) tears the socket task down; events that already
/// arrived stay readable until the receiver drains.
///
/// [`close`]: Subscription::close
pub struct Subscription {
    events: mpsc::UnboundedReceiver<RoomEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Connect and subscribe. `base_ws_url` is the relay origin with a
    /// ws scheme, e.g. `ws://localhost:3000`. The session token rides a
    /// query parameter; it is lowercase hex, so no escaping is needed.
    pub async fn connect(
        base_ws_url: &str,
        room_id: Uuid,
        token: &str,
    ) -> Result<Self, ClientError> {
        let url = format!(
            "{}/rooms/{}/subscribe?token={}",
            base_ws_url.trim_end_matches('/'),
            room_id,
            token,
        );
        let (stream, _) = connect_async(url).await?;
        let (mut sink, mut source) = stream.split();
        let (tx, events) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let frame = match frame {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(error = %err, "event stream error");
                        break;
                    }
                };
                match frame {
                    WsMessage::Text(text) => match serde_json::from_str::<RoomEvent>(&text) {
                        Ok(event) => {
                            let closing = matches!(event, RoomEvent::RoomClosed);
                            if tx.send(event).is_err() {
                                break;
                            }
                            if closing {
                                debug!(room_id = %room_id, "room closed by relay");
                                break;
                            }
                        }
                        Err(err) => warn!(error = %err, "unparseable room event"),
                    },
                    WsMessage::Ping(payload) => {
                        if sink.send(WsMessage::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    WsMessage::Close(_) => break,
                    _ => {}
                }
            }
        });

        Ok(Self { events, task })
    }

    /// Next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        self.events.recv().await
    }

    /// Stop the stream. Idempotent; buffered events stay readable.
    pub fn close(&mut self) {
        self.task.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
