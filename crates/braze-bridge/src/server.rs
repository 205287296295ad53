//! The authenticated duplex WebSocket server.
//!
//! One listener serves both protocol directions. Per connection:
//!
//! - the upgrade handler checks credentials and rejects bad ones with an
//!   HTTP 401 before any WebSocket frame is exchanged;
//! - a forwarder task drains the connection's outbound queue into the
//!   socket, so a slow subscriber only ever backs up its own queue;
//! - the receive loop parses inbound command envelopes, relays them to the
//!   host command surface and queues the reply on the same connection.
//!
//! A publisher task consumes the dispatch engine's event channel and fans
//! each publishable frame out to every open connection independently.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, RawQuery, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use braze_core::Event;
use braze_host::CommandAdapter;

use crate::auth;
use crate::error::{BridgeError, BridgeResult};
use crate::wire::{self, CommandRequest};

/// Outbound queue depth per subscriber connection.
const OUTBOUND_QUEUE: usize = 256;

/// WebSocket bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// URL path subscribers connect to.
    pub path: String,
    /// Pre-shared handshake secret; `None` accepts every connection.
    pub access_token: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6700,
            path: "/".to_string(),
            access_token: None,
        }
    }
}

impl BridgeConfig {
    /// The socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared state of a running bridge.
struct ServerState {
    /// Relay for inbound command requests.
    adapter: Arc<CommandAdapter>,
    /// Handshake secret.
    secret: Option<String>,
    /// Open connections (connection id -> outbound queue).
    connections: RwLock<HashMap<u64, mpsc::Sender<String>>>,
    /// Connection id allocator.
    next_conn_id: AtomicU64,
}

/// Handle to a running bridge.
///
/// Dropping the handle does not stop the bridge; call
/// [`shutdown`](BridgeHandle::shutdown).
#[derive(Clone)]
pub struct BridgeHandle {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    state: Arc<ServerState>,
}

impl BridgeHandle {
    /// The address the bridge actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently open subscriber connections.
    ///
    /// Useful for monitoring; a subscriber counts once its handshake has
    /// fully completed.
    pub async fn subscriber_count(&self) -> usize {
        self.state.connections.read().await.len()
    }

    /// Stops the listener and the publisher task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for BridgeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("local_addr", &self.local_addr)
            .finish_non_exhaustive()
    }
}

/// The authenticated publish/request WebSocket server.
pub struct ProtocolBridge {
    config: BridgeConfig,
    adapter: Arc<CommandAdapter>,
}

impl ProtocolBridge {
    /// Creates a bridge over the given command adapter.
    pub fn new(config: BridgeConfig, adapter: Arc<CommandAdapter>) -> Self {
        Self { config, adapter }
    }

    /// Binds the listener and spawns the server and publisher tasks.
    ///
    /// `events` is the dispatch engine's outbound channel; every event
    /// received on it is mapped through [`wire::publish_frame`] and fanned
    /// out to the open connections.
    pub async fn start(self, events: mpsc::Receiver<Event>) -> BridgeResult<BridgeHandle> {
        let state = Arc::new(ServerState {
            adapter: self.adapter,
            secret: self.config.access_token.clone(),
            connections: RwLock::new(HashMap::new()),
            next_conn_id: AtomicU64::new(1),
        });

        let path = if self.config.path.starts_with('/') {
            self.config.path.clone()
        } else {
            format!("/{}", self.config.path)
        };

        let router = Router::new()
            .route(&path, get(ws_handler))
            .with_state(state.clone());

        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| BridgeError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, path = %path, "bridge listening");

        let cancel = CancellationToken::new();

        let serve_cancel = cancel.clone();
        tokio::spawn(async move {
            let server = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            );
            tokio::select! {
                result = server => {
                    if let Err(e) = result {
                        error!(error = %e, "bridge server error");
                    }
                }
                _ = serve_cancel.cancelled() => {
                    info!("bridge shutting down");
                }
            }
        });

        let publish_state = state.clone();
        let publish_cancel = cancel.clone();
        tokio::spawn(run_publisher(publish_state, events, publish_cancel));

        Ok(BridgeHandle {
            local_addr,
            cancel,
            state,
        })
    }
}

/// Fans dispatched events out to every open connection.
async fn run_publisher(
    state: Arc<ServerState>,
    mut events: mpsc::Receiver<Event>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            maybe = events.recv() => match maybe {
                Some(event) => event,
                None => break,
            },
            _ = cancel.cancelled() => break,
        };

        let Some(frame) = wire::publish_frame(&event) else {
            continue;
        };
        let text = frame.to_string();

        let connections = state.connections.read().await;
        for (conn_id, queue) in connections.iter() {
            // try_send keeps one stuffed or dying connection from holding up
            // the rest; its own forwarder task tears it down.
            if let Err(e) = queue.try_send(text.clone()) {
                debug!(conn_id, error = %e, "skipping subscriber");
            }
        }
    }
    debug!("publisher stopped");
}

/// Upgrade handler: authenticates, then hands the socket to the session loop.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !auth::authorize(state.secret.as_deref(), &headers, query.as_deref()) {
        warn!(remote_addr = %addr, "rejecting subscriber with bad credentials");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Runs one open subscriber connection to completion.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: Arc<ServerState>) {
    let conn_id = state.next_conn_id.fetch_add(1, Ordering::Relaxed);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (queue_tx, mut queue_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
    state
        .connections
        .write()
        .await
        .insert(conn_id, queue_tx.clone());
    info!(conn_id, remote_addr = %addr, "subscriber connected");

    // Forwarder: the only task writing to this socket.
    let send_task = tokio::spawn(async move {
        while let Some(text) = queue_rx.recv().await {
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                trace!(conn_id, len = text.len(), "inbound frame");
                // Malformed frames and unmatched actions are dropped without
                // a reply; the connection stays open.
                let Some(request) = CommandRequest::parse(&text) else {
                    continue;
                };
                let Some(reply) = state.adapter.execute(&request.action, &request.params) else {
                    continue;
                };
                if queue_tx.send(reply.to_string()).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!(conn_id, "subscriber closed connection");
                break;
            }
            Ok(_) => {
                // Binary, ping and pong frames are not part of the protocol.
            }
            Err(e) => {
                warn!(conn_id, error = %e, "subscriber socket error");
                break;
            }
        }
    }

    send_task.abort();
    state.connections.write().await.remove(&conn_id);
    info!(conn_id, "subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use braze_core::{EventKind, RawNotification};
    use braze_host::{FriendInfo, GroupInfo, GroupMemberInfo, HostApi, StrangerInfo};
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Error as WsError;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct MockHost {
        sends: AtomicUsize,
    }

    impl MockHost {
        fn new() -> Self {
            Self {
                sends: AtomicUsize::new(0),
            }
        }
    }

    impl HostApi for MockHost {
        fn send_group_message(&self, _group_id: i64, _message: &str) -> i32 {
            self.sends.fetch_add(1, Ordering::SeqCst);
            55
        }

        fn send_private_message(&self, _user_id: i64, _message: &str) -> i32 {
            self.sends.fetch_add(1, Ordering::SeqCst);
            56
        }

        fn send_discuss_message(&self, _discuss_id: i64, _message: &str) -> i32 {
            self.sends.fetch_add(1, Ordering::SeqCst);
            57
        }

        fn login_id(&self) -> i64 {
            10_001
        }

        fn login_nickname(&self) -> String {
            "relay".into()
        }

        fn stranger_info(&self, _user_id: i64) -> Option<StrangerInfo> {
            None
        }

        fn group_member_info(&self, _group_id: i64, _user_id: i64) -> Option<GroupMemberInfo> {
            None
        }

        fn group_member_list(&self, _group_id: i64) -> Vec<GroupMemberInfo> {
            Vec::new()
        }

        fn friend_list(&self) -> Vec<FriendInfo> {
            Vec::new()
        }

        fn group_list(&self) -> Vec<GroupInfo> {
            Vec::new()
        }
    }

    async fn start_bridge(
        token: Option<&str>,
    ) -> (BridgeHandle, mpsc::Sender<Event>, Arc<MockHost>) {
        let host = Arc::new(MockHost::new());
        let adapter = Arc::new(CommandAdapter::new(host.clone()));
        let config = BridgeConfig {
            host: "127.0.0.1".into(),
            port: 0,
            path: "/".into(),
            access_token: token.map(String::from),
        };
        let (events_tx, events_rx) = mpsc::channel(16);
        let handle = ProtocolBridge::new(config, adapter)
            .start(events_rx)
            .await
            .unwrap();
        (handle, events_tx, host)
    }

    async fn connect_with_bearer(handle: &BridgeHandle, token: &str) -> Client {
        let mut request = format!("ws://{}/", handle.local_addr())
            .into_client_request()
            .unwrap();
        request.headers_mut().insert(
            AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        let (client, _) = connect_async(request).await.unwrap();
        client
    }

    async fn connect_with_query(handle: &BridgeHandle, token: &str) -> Client {
        let url = format!("ws://{}/?access_token={token}", handle.local_addr());
        let (client, _) = connect_async(url).await.unwrap();
        client
    }

    async fn next_json(client: &mut Client) -> Value {
        let msg = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("socket error");
        serde_json::from_str(msg.into_text().unwrap().as_str()).unwrap()
    }

    /// Blocks until `n` subscribers have completed their handshake.
    async fn wait_for_subscribers(handle: &BridgeHandle, n: usize) {
        timeout(Duration::from_secs(5), async {
            while handle.subscriber_count().await < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscribers never registered");
    }

    fn group_message_event() -> Event {
        let raw = RawNotification::new(1)
            .with_message_id(9)
            .with_user_id(123)
            .with_group_id(456)
            .with_text("hi");
        Event::build(EventKind::GroupMessage, raw).unwrap()
    }

    /// Publishing reaches a bearer-form and a query-form subscriber alike.
    #[tokio::test]
    async fn both_credential_forms_receive_the_same_frame() {
        let (handle, events, _) = start_bridge(Some("s3cret")).await;
        let mut bearer = connect_with_bearer(&handle, "s3cret").await;
        let mut query = connect_with_query(&handle, "s3cret").await;
        wait_for_subscribers(&handle, 2).await;

        events.send(group_message_event()).await.unwrap();

        let from_bearer = next_json(&mut bearer).await;
        let from_query = next_json(&mut query).await;
        assert_eq!(from_bearer, from_query);
        assert_eq!(from_bearer["user_id"], 123);
        assert_eq!(from_bearer["group_id"], 456);
        assert_eq!(from_bearer["message"], "hi");

        handle.shutdown();
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected_before_upgrade() {
        let (handle, _events, _) = start_bridge(Some("s3cret")).await;

        let url = format!("ws://{}/?access_token=wrong", handle.local_addr());
        let err = connect_async(url).await.unwrap_err();
        match err {
            WsError::Http(response) => assert_eq!(response.status(), 401),
            other => panic!("expected HTTP rejection, got {other:?}"),
        }

        handle.shutdown();
    }

    #[tokio::test]
    async fn request_reply_round_trip() {
        let (handle, _events, _) = start_bridge(Some("s3cret")).await;
        let mut client = connect_with_bearer(&handle, "s3cret").await;

        client
            .send(WsMessage::text(r#"{"action":"GetLoginQQ"}"#))
            .await
            .unwrap();

        assert_eq!(next_json(&mut client).await, Value::from(10_001));

        handle.shutdown();
    }

    /// Unknown actions and malformed frames produce no reply; the connection
    /// keeps working.
    #[tokio::test]
    async fn unmatched_frames_are_silently_dropped() {
        let (handle, _events, _) = start_bridge(None).await;
        let mut client = connect_with_query(&handle, "ignored").await;

        client.send(WsMessage::text("not json")).await.unwrap();
        client
            .send(WsMessage::text(r#"{"action":"NoSuchAction"}"#))
            .await
            .unwrap();
        client
            .send(WsMessage::text(r#"{"action":"GetLoginNick"}"#))
            .await
            .unwrap();

        // The first reply to arrive answers the third frame.
        assert_eq!(next_json(&mut client).await, Value::from("relay"));

        handle.shutdown();
    }

    #[tokio::test]
    async fn missing_parameter_executes_nothing() {
        let (handle, _events, host) = start_bridge(None).await;
        let mut client = connect_with_query(&handle, "ignored").await;

        client
            .send(WsMessage::text(
                r#"{"action":"SendGroupMessage","params":{"group_id":456}}"#,
            ))
            .await
            .unwrap();
        client
            .send(WsMessage::text(r#"{"action":"GetLoginQQ"}"#))
            .await
            .unwrap();

        assert_eq!(next_json(&mut client).await, Value::from(10_001));
        assert_eq!(host.sends.load(Ordering::SeqCst), 0);

        handle.shutdown();
    }

    /// Delivery to live subscribers is independent of failed ones.
    #[tokio::test]
    async fn fan_out_survives_a_dropped_subscriber() {
        let (handle, events, _) = start_bridge(Some("s3cret")).await;
        let mut live = connect_with_bearer(&handle, "s3cret").await;
        let doomed = connect_with_bearer(&handle, "s3cret").await;
        wait_for_subscribers(&handle, 2).await;
        drop(doomed);

        events.send(group_message_event()).await.unwrap();
        assert_eq!(next_json(&mut live).await["message"], "hi");

        events.send(group_message_event()).await.unwrap();
        assert_eq!(next_json(&mut live).await["message"], "hi");

        handle.shutdown();
    }
}
