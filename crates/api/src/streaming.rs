//! WebSocket streaming API.
//!
//! One in-process broadcast channel carries every event. Each envelope is
//! either addressed to everyone or to a single user's room; connections
//! filter on the rooms they joined.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use humap_common::{AppError, AppResult, config::StreamingConfig};
use humap_core::{EventPublisher, events};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::middleware::AppState;

/// Streaming query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Access token for authentication.
    #[serde(rename = "i")]
    pub token: Option<String>,
}

/// Client-to-server message.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum ClientMessage {
    /// Subscribe to a user's private room.
    #[serde(rename = "join:user")]
    JoinUser(String),
}

/// Server-to-client message: `{"type": <event>, "body": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub event: String,
    pub body: Value,
}

/// An event on the shared channel.
#[derive(Debug)]
struct Envelope {
    /// `None` for broadcast, otherwise the room's user ID.
    target: Option<String>,
    event: String,
    payload: Value,
}

/// Shared state for streaming.
#[derive(Clone)]
pub struct StreamingState {
    tx: Arc<broadcast::Sender<Arc<Envelope>>>,
    require_authenticated_join: bool,
}

impl StreamingState {
    /// Create a new streaming state.
    #[must_use]
    pub fn new(config: &StreamingConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity.max(1));

        Self {
            tx: Arc::new(tx),
            require_authenticated_join: config.require_authenticated_join,
        }
    }

    /// Open a connection. `authenticated_user` is the socket's token owner, if any.
    #[must_use]
    pub fn connect(&self, authenticated_user: Option<String>) -> Connection {
        Connection {
            rx: self.tx.subscribe(),
            rooms: HashSet::new(),
            authenticated_user,
            require_authenticated_join: self.require_authenticated_join,
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn send(&self, envelope: Envelope) {
        // Err only means nobody is connected
        if self.tx.send(Arc::new(envelope)).is_err() {
            debug!("No streaming connections, event dropped");
        }
    }
}

#[async_trait]
impl EventPublisher for StreamingState {
    async fn publish_broadcast(&self, event: &str, payload: Value) -> AppResult<()> {
        self.send(Envelope {
            target: None,
            event: event.to_string(),
            payload,
        });
        Ok(())
    }

    async fn publish_to_user(&self, user_id: &str, event: &str, payload: Value) -> AppResult<()> {
        self.send(Envelope {
            target: Some(user_id.to_string()),
            event: event.to_string(),
            payload,
        });
        Ok(())
    }
}

/// One client's subscription.
///
/// Starts anonymous: it sees broadcasts only until it joins a room.
pub struct Connection {
    rx: broadcast::Receiver<Arc<Envelope>>,
    rooms: HashSet<String>,
    authenticated_user: Option<String>,
    require_authenticated_join: bool,
}

impl Connection {
    /// Join `user_id`'s room.
    ///
    /// With `require_authenticated_join`, only the socket's own user may be
    /// joined.
    pub fn join(&mut self, user_id: &str) -> AppResult<()> {
        if user_id.is_empty() {
            return Err(AppError::BadRequest("userId is required".to_string()));
        }
        if self.require_authenticated_join && self.authenticated_user.as_deref() != Some(user_id)
        {
            return Err(AppError::access_denied());
        }

        self.rooms.insert(user_id.to_string());
        Ok(())
    }

    #[must_use]
    pub fn has_joined(&self, user_id: &str) -> bool {
        self.rooms.contains(user_id)
    }

    /// Wait for the next event addressed to this connection.
    ///
    /// Returns `None` once the channel is closed. Events missed while lagging
    /// behind are skipped. Cancel-safe.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) => {
                    let visible = envelope
                        .target
                        .as_ref()
                        .is_none_or(|room| self.rooms.contains(room));
                    if visible {
                        return Some(ServerMessage {
                            event: envelope.event.clone(),
                            body: envelope.payload.clone(),
                        });
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Streaming connection lagged, events skipped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Apply a client message, returning the reply to send back.
    fn handle_client_message(&mut self, msg: ClientMessage) -> ServerMessage {
        match msg {
            ClientMessage::JoinUser(user_id) => match self.join(&user_id) {
                Ok(()) => {
                    info!(user_id = %user_id, "Joined user room");
                    ServerMessage {
                        event: events::JOINED.to_string(),
                        body: json!({ "userId": user_id }),
                    }
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Room join rejected");
                    ServerMessage {
                        event: events::ERROR.to_string(),
                        body: json!({ "message": e.to_string() }),
                    }
                }
            },
        }
    }
}

/// WebSocket handler for streaming.
pub async fn streaming_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("New streaming connection");

    ws.on_upgrade(move |socket| handle_socket(socket, query, state))
}

/// Handle a WebSocket connection.
async fn handle_socket(socket: WebSocket, query: StreamQuery, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Authenticate if token provided
    let user_id = match &query.token {
        Some(token) => match state.user_service.authenticate_by_token(token).await {
            Ok(u) => Some(u.id),
            Err(e) => {
                warn!(error = %e, "Streaming auth failed");
                None
            }
        },
        None => None,
    };

    info!(user_id = ?user_id, "Streaming connection established");
    let mut connection = state.streaming.connect(user_id);

    loop {
        tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                let reply = match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => Some(connection.handle_client_message(client_msg)),
                            Err(e) => {
                                warn!(error = %e, "Failed to parse client message");
                                None
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                        None
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Client closed connection");
                        break;
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                };

                if let Some(reply) = reply {
                    if send_message(&mut sender, &reply).await.is_err() {
                        break;
                    }
                }
            }

            // Handle broadcast and room events
            event = connection.recv() => {
                let Some(event) = event else { break };
                if send_message(&mut sender, &event).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("Streaming connection closed");
}

/// Encode a frame; `None` (logged) if it can't be serialized.
fn encode_frame<T: Serialize>(msg: &T) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to encode streaming frame, skipped");
            None
        }
    }
}

async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let Some(json) = encode_frame(msg) else {
        return Ok(());
    };
    sender.send(Message::Text(json.into())).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn state(require_authenticated_join: bool) -> StreamingState {
        StreamingState::new(&StreamingConfig {
            channel_capacity: 16,
            require_authenticated_join,
        })
    }

    async fn next(conn: &mut Connection) -> Option<ServerMessage> {
        timeout(Duration::from_millis(50), conn.recv()).await.ok().flatten()
    }

    #[test]
    fn test_client_message_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join:user","body":"bob"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinUser(ref id) if id == "bob"));
    }

    #[test]
    fn test_server_message_wire_format() {
        let msg = ServerMessage {
            event: events::NOTIFICATION_LIKE.to_string(),
            body: json!({ "activityId": "a1" }),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "type": "notification:like", "body": { "activityId": "a1" } })
        );
    }

    #[test]
    fn test_unencodable_frame_is_skipped() {
        let mut bad = std::collections::HashMap::new();
        bad.insert((1, 2), "tuple keys are not valid JSON object keys");

        assert!(encode_frame(&bad).is_none());

        let ok = ServerMessage {
            event: events::JOINED.to_string(),
            body: json!({ "userId": "bob" }),
        };
        assert_eq!(
            encode_frame(&ok).as_deref(),
            Some(r#"{"type":"joined","body":{"userId":"bob"}}"#)
        );
    }

    #[tokio::test]
    async fn test_room_delivery_only_reaches_joined_connections() {
        let state = state(false);
        let mut bob = state.connect(None);
        let mut other = state.connect(None);
        bob.join("bob").unwrap();

        state
            .publish_to_user("bob", events::NOTIFICATION_LIKE, json!({ "n": 1 }))
            .await
            .unwrap();

        let got = next(&mut bob).await.unwrap();
        assert_eq!(got.event, events::NOTIFICATION_LIKE);
        assert_eq!(got.body["n"], 1);
        assert!(next(&mut other).await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_anonymous_connections() {
        let state = state(false);
        let mut anon = state.connect(None);

        state
            .publish_broadcast(events::ACTIVITY_CREATED, json!({ "id": "a1" }))
            .await
            .unwrap();

        assert_eq!(next(&mut anon).await.unwrap().body["id"], "a1");
    }

    #[tokio::test]
    async fn test_publish_without_connections_is_ok() {
        let state = state(false);

        assert!(
            state
                .publish_to_user("nobody", events::NOTIFICATION_LIKE, json!({}))
                .await
                .is_ok()
        );
        assert_eq!(state.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_reconnect_must_rejoin() {
        let state = state(false);
        let mut first = state.connect(None);
        first.join("bob").unwrap();
        drop(first);

        let mut second = state.connect(None);
        state
            .publish_to_user("bob", events::NOTIFICATION_LIKE, json!({}))
            .await
            .unwrap();

        assert!(!second.has_joined("bob"));
        assert!(next(&mut second).await.is_none());
    }

    #[test]
    fn test_open_join_allows_any_room() {
        let state = state(false);
        let mut conn = state.connect(None);

        assert!(conn.join("bob").is_ok());
        assert!(conn.has_joined("bob"));
    }

    #[test]
    fn test_authenticated_join_is_enforced_when_required() {
        let state = state(true);

        let mut anon = state.connect(None);
        assert!(matches!(anon.join("bob"), Err(AppError::Forbidden(_))));

        let mut alice = state.connect(Some("alice".to_string()));
        assert!(matches!(alice.join("bob"), Err(AppError::Forbidden(_))));
        assert!(alice.join("alice").is_ok());
    }

    #[test]
    fn test_join_reply() {
        let state = state(true);
        let mut conn = state.connect(Some("alice".to_string()));

        let ok = conn.handle_client_message(ClientMessage::JoinUser("alice".to_string()));
        assert_eq!(ok.event, events::JOINED);

        let denied = conn.handle_client_message(ClientMessage::JoinUser("bob".to_string()));
        assert_eq!(denied.event, events::ERROR);
    }
}
