//! End-to-end tests against a local WebSocket server.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use arena_auth::SessionError;
use arena_core::BackoffConfig;
use arena_protocol::payloads::{
    Channel, ChannelType, ErrorCode, MatchDataSend, Notification, Notifications, Pong, Rpc,
    ServerError,
};
use arena_protocol::{Envelope, Format, Message, MessageKind, decode, encode};
use arena_realtime::{
    ConnectionStatus, RealtimeClient, RealtimeConfig, RealtimeError, StaticTokenSource,
    TokenSource,
};
use assert_matches::assert_matches;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Push(Envelope),
    Close,
}

/// A scripted server: answers requests unless their kind is silenced,
/// forwards every request to the test, and pushes on command.
struct FakeServer {
    url: String,
    commands: mpsc::UnboundedSender<Command>,
    requests: mpsc::UnboundedReceiver<Envelope>,
    queries: mpsc::UnboundedReceiver<String>,
}

impl FakeServer {
    async fn start(format: Format, silent: &[MessageKind]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (commands, mut command_rx) = mpsc::unbounded_channel();
        let (request_tx, requests) = mpsc::unbounded_channel();
        let (query_tx, queries) = mpsc::unbounded_channel();
        let silent: HashSet<MessageKind> = silent.iter().copied().collect();

        drop(tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let query_tx = query_tx.clone();
                let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let _ = query_tx.send(req.uri().query().unwrap_or_default().to_string());
                    Ok(resp)
                };
                let Ok(mut ws) = tokio_tungstenite::accept_hdr_async(tcp, callback).await else {
                    continue;
                };
                serve(&mut ws, format, &silent, &mut command_rx, &request_tx).await;
            }
        }));

        Self {
            url: format!("http://{addr}"),
            commands,
            requests,
            queries,
        }
    }

    fn push(&self, message: impl Into<Message>) {
        let _ = self.commands.send(Command::Push(Envelope {
            cid: String::new(),
            message: Some(message.into()),
        }));
    }

    fn drop_connection(&self) {
        let _ = self.commands.send(Command::Close);
    }

    async fn next_request(&mut self) -> Envelope {
        timeout(TIMEOUT, self.requests.recv())
            .await
            .expect("timeout waiting for request")
            .expect("server stopped")
    }

    async fn next_query(&mut self) -> String {
        timeout(TIMEOUT, self.queries.recv())
            .await
            .expect("timeout waiting for handshake")
            .expect("server stopped")
    }
}

async fn serve(
    ws: &mut WebSocketStream<TcpStream>,
    format: Format,
    silent: &HashSet<MessageKind>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    requests: &mpsc::UnboundedSender<Envelope>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Push(envelope)) => {
                    if ws.send(frame(&envelope, format)).await.is_err() {
                        return;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = ws.close(None).await;
                    return;
                }
            },
            incoming = ws.next() => {
                let Some(Ok(incoming)) = incoming else { return };
                let bytes = match incoming {
                    Frame::Binary(bytes) => bytes.to_vec(),
                    Frame::Text(text) => text.as_bytes().to_vec(),
                    _ => continue,
                };
                let envelope = decode(&bytes, format).unwrap();
                let _ = requests.send(envelope.clone());
                if let Some(reply) = reply_for(&envelope, silent) {
                    if ws.send(frame(&reply, format)).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

fn reply_for(request: &Envelope, silent: &HashSet<MessageKind>) -> Option<Envelope> {
    let kind = request.kind()?;
    if !request.has_cid() || silent.contains(&kind) {
        return None;
    }
    let message: Option<Message> = match request.message.clone()? {
        Message::Ping(_) => Some(Pong {}.into()),
        Message::ChannelJoin(join) => Some(
            Channel {
                id: format!("2...{}", join.target),
                room_name: join.target,
                ..Default::default()
            }
            .into(),
        ),
        Message::Rpc(rpc) => Some(
            Rpc {
                id: rpc.id,
                payload: rpc.payload,
                ..Default::default()
            }
            .into(),
        ),
        Message::MatchJoin(join) if join.match_id == "missing" => Some(
            ServerError {
                code: ErrorCode::MatchNotFound as i32,
                message: "match not found".into(),
                ..Default::default()
            }
            .into(),
        ),
        _ => None,
    };
    Some(Envelope {
        cid: request.cid.clone(),
        message,
    })
}

fn frame(envelope: &Envelope, format: Format) -> Frame {
    let bytes = encode(envelope, format).unwrap();
    match format {
        Format::Binary => Frame::Binary(bytes.into()),
        Format::Text => Frame::Text(String::from_utf8(bytes).unwrap().into()),
    }
}

fn client_for(server: &FakeServer, config: RealtimeConfig) -> RealtimeClient {
    RealtimeClient::new(
        Arc::new(StaticTokenSource::new(server.url.clone(), "test-token")),
        config,
    )
}

async fn eventually(what: &str, check: impl Fn() -> bool) {
    let wait = async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    timeout(TIMEOUT, wait)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

fn notifications(subject: &str) -> Notifications {
    Notifications {
        notifications: vec![Notification {
            id: format!("id-{subject}"),
            subject: subject.into(),
            ..Default::default()
        }],
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn join_channel_resolves_with_channel() {
    let mut server = FakeServer::start(Format::Binary, &[]).await;
    let client = client_for(&server, RealtimeConfig::default());

    client.open().await.unwrap();
    assert_eq!(client.status(), ConnectionStatus::Open);
    let query = server.next_query().await;
    assert!(query.contains("token=test-token"), "{query}");
    assert!(query.contains("format=protobuf"), "{query}");
    assert!(query.contains("status=true"), "{query}");

    let channel = client
        .join_channel("lobby", ChannelType::Room, false, false)
        .await
        .unwrap();
    assert_eq!(channel.id, "2...lobby");
    assert_eq!(channel.room_name, "lobby");
    assert_eq!(client.pending_calls(), 0);

    let request = server.next_request().await;
    assert_eq!(request.cid, "1");
    assert_eq!(request.kind(), Some(MessageKind::ChannelJoin));

    client.close().await;
    assert_eq!(client.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn text_format_rpc_round_trip() {
    let mut server = FakeServer::start(Format::Text, &[]).await;
    let client = client_for(&server, RealtimeConfig::default().with_format(Format::Text));
    client.open().await.unwrap();
    assert!(server.next_query().await.contains("format=json"));

    let reply = client.rpc("echo", r#"{"n":1}"#).await.unwrap();
    assert_eq!(reply.id, "echo");
    assert_eq!(reply.payload, r#"{"n":1}"#);

    let value: serde_json::Value = client
        .rpc_json("echo", &serde_json::json!({ "hello": "world" }))
        .await
        .unwrap();
    assert_eq!(value["hello"], "world");

    client.close().await;
}

#[tokio::test]
async fn error_reply_fails_the_call() {
    let server = FakeServer::start(Format::Binary, &[]).await;
    let client = client_for(&server, RealtimeConfig::default());
    client.open().await.unwrap();

    let err = client
        .join_match("missing", Default::default())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        RealtimeError::Protocol { code: 4, ref message, .. } if message == "match not found"
    );
    assert_eq!(client.status(), ConnectionStatus::Open);
    client.close().await;
}

#[tokio::test]
async fn ack_and_no_reply_requests() {
    let mut server = FakeServer::start(Format::Binary, &[]).await;
    let client = client_for(&server, RealtimeConfig::default());
    client.open().await.unwrap();

    client.leave_channel("2...lobby").await.unwrap();
    let leave = server.next_request().await;
    assert!(leave.has_cid());

    client
        .send_match_data("m1", 7, vec![1, 2, 3], Vec::new(), true)
        .await
        .unwrap();
    let data = server.next_request().await;
    assert!(!data.has_cid());
    assert_matches!(
        data.message,
        Some(Message::MatchDataSend(MatchDataSend { op_code: 7, ref data, .. })) if data == &[1, 2, 3]
    );
    assert_eq!(client.pending_calls(), 0);
    client.close().await;
}

#[tokio::test]
async fn push_without_handler_is_dropped_then_delivered_once() {
    let server = FakeServer::start(Format::Binary, &[]).await;
    let client = client_for(&server, RealtimeConfig::default());
    client.open().await.unwrap();

    server.push(notifications("early"));
    // Frames are read in order, so the push is handled before the pong.
    client.ping().await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _subscription = client.handlers().on_notifications(move |n| {
        let _ = tx.send(n.notifications[0].subject.clone());
    });
    server.push(notifications("late"));
    client.ping().await.unwrap();

    let subject = timeout(TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(subject, "late");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
    client.close().await;
}

#[tokio::test]
async fn peer_close_drains_every_pending_call() {
    let mut server = FakeServer::start(Format::Binary, &[MessageKind::ChannelJoin]).await;
    let client = client_for(&server, RealtimeConfig::default());
    let causes = Arc::new(Mutex::new(Vec::new()));
    {
        let causes = causes.clone();
        client.on_disconnect(move |cause| causes.lock().push(cause.clone()));
    }
    client.open().await.unwrap();

    let calls: Vec<_> = (0..5)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .join_channel(format!("room-{i}"), ChannelType::Room, false, false)
                    .await
            })
        })
        .collect();

    let mut cids = HashSet::new();
    for _ in 0..5 {
        assert!(cids.insert(server.next_request().await.cid));
    }
    assert_eq!(client.pending_calls(), 5);

    server.drop_connection();
    for call in calls {
        let result = timeout(TIMEOUT, call).await.unwrap().unwrap();
        assert_eq!(result.unwrap_err(), RealtimeError::ConnectionClosed);
    }
    assert_eq!(client.pending_calls(), 0);
    eventually("closed status", || client.status() == ConnectionStatus::Closed).await;

    let causes = causes.lock();
    assert_eq!(causes.len(), 1);
    assert_matches!(causes[0], RealtimeError::Read(_));
}

#[tokio::test]
async fn concurrent_sends_get_distinct_cids() {
    let mut server = FakeServer::start(Format::Binary, &[]).await;
    let client = client_for(&server, RealtimeConfig::default());
    client.open().await.unwrap();

    let results = future::join_all((0..20).map(|_| client.ping())).await;
    assert!(results.iter().all(Result::is_ok));
    assert_eq!(client.pending_calls(), 0);

    let mut cids = HashSet::new();
    for _ in 0..20 {
        let request = server.next_request().await;
        assert!(request.has_cid());
        assert!(cids.insert(request.cid));
    }
    client.close().await;
}

#[tokio::test]
async fn cancelling_one_call_keeps_the_socket() {
    let mut server = FakeServer::start(Format::Binary, &[MessageKind::ChannelJoin]).await;
    let client = client_for(&server, RealtimeConfig::default());
    client.open().await.unwrap();

    let cancel = CancellationToken::new();
    let call = {
        let client = client.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            client
                .send_with_cancel(
                    Envelope::request(arena_protocol::payloads::ChannelJoin {
                        target: "quiet".into(),
                        ..Default::default()
                    }),
                    &cancel,
                )
                .await
        })
    };
    let _ = server.next_request().await;
    assert_eq!(client.pending_calls(), 1);

    cancel.cancel();
    let result = timeout(TIMEOUT, call).await.unwrap().unwrap();
    assert_eq!(result, Err(RealtimeError::Cancelled));
    assert_eq!(client.pending_calls(), 0);

    assert_eq!(client.status(), ConnectionStatus::Open);
    client.ping().await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn request_timeout_fails_only_that_call() {
    let server = FakeServer::start(Format::Binary, &[MessageKind::ChannelJoin]).await;
    let config = RealtimeConfig {
        request_timeout: Some(Duration::from_millis(100)),
        ..RealtimeConfig::default()
    };
    let client = client_for(&server, config);
    client.open().await.unwrap();

    let err = client
        .join_channel("quiet", ChannelType::Room, false, false)
        .await
        .unwrap_err();
    assert_eq!(err, RealtimeError::Timeout(100));
    assert_eq!(client.pending_calls(), 0);
    client.ping().await.unwrap();
    client.close().await;
}

#[tokio::test]
async fn missed_pings_tear_down() {
    let server = FakeServer::start(Format::Binary, &[MessageKind::Ping]).await;
    let config = RealtimeConfig {
        ping_interval: Some(Duration::from_millis(50)),
        ..RealtimeConfig::default()
    };
    let client = client_for(&server, config);
    let causes = Arc::new(Mutex::new(Vec::new()));
    {
        let causes = causes.clone();
        client.on_disconnect(move |cause| causes.lock().push(cause.clone()));
    }
    client.open().await.unwrap();

    eventually("keepalive teardown", || !causes.lock().is_empty()).await;
    assert_eq!(causes.lock()[0], RealtimeError::Read("ping timeout".into()));
    assert_eq!(client.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn persist_mode_redials_after_drop() {
    let server = FakeServer::start(Format::Binary, &[]).await;
    let config = RealtimeConfig {
        persist: true,
        poll_interval: Duration::from_millis(20),
        backoff: BackoffConfig {
            floor_ms: 10,
            ceiling_ms: 50,
            multiplier: 2.0,
            jitter_factor: 0.0,
        },
        ..RealtimeConfig::default()
    };
    let client = client_for(&server, config);
    let connects = Arc::new(AtomicUsize::new(0));
    {
        let connects = connects.clone();
        client.on_connect(move || {
            let _ = connects.fetch_add(1, Ordering::SeqCst);
        });
    }

    client.open().await.unwrap();
    eventually("first connect", || connects.load(Ordering::SeqCst) == 1).await;

    server.drop_connection();
    eventually("reconnect", || connects.load(Ordering::SeqCst) == 2).await;
    eventually("open again", || client.status() == ConnectionStatus::Open).await;
    client.ping().await.unwrap();

    client.close().await;
    assert_eq!(client.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn persist_mode_against_unreachable_port() {
    let config = RealtimeConfig {
        persist: true,
        poll_interval: Duration::from_millis(250),
        backoff: BackoffConfig {
            floor_ms: 10,
            ceiling_ms: 40,
            multiplier: 2.0,
            jitter_factor: 0.0,
        },
        ..RealtimeConfig::default()
    };
    let client = RealtimeClient::new(
        Arc::new(StaticTokenSource::new("http://127.0.0.1:1", "t")),
        config,
    );
    let connects = Arc::new(AtomicUsize::new(0));
    {
        let connects = connects.clone();
        client.on_connect(move || {
            let _ = connects.fetch_add(1, Ordering::SeqCst);
        });
    }

    client.open().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.status(), ConnectionStatus::Connecting);
    assert_eq!(connects.load(Ordering::SeqCst), 0);

    timeout(Duration::from_millis(250), client.close())
        .await
        .expect("close should stop the supervisor within one poll interval");
    assert_eq!(client.status(), ConnectionStatus::Closed);
}

/// A session whose refresh token has run out.
struct ExpiredRefresh {
    refreshes: AtomicUsize,
}

#[async_trait]
impl TokenSource for ExpiredRefresh {
    async fn current_token(&self) -> Result<String, SessionError> {
        Ok("stale".into())
    }

    async fn refresh_session(&self) -> Result<(), SessionError> {
        let _ = self.refreshes.fetch_add(1, Ordering::SeqCst);
        Err(SessionError::RefreshExpired)
    }

    fn base_socket_url(&self) -> String {
        "http://127.0.0.1:1".into()
    }
}

fn fast_persist() -> RealtimeConfig {
    RealtimeConfig {
        persist: true,
        poll_interval: Duration::from_millis(50),
        backoff: BackoffConfig {
            floor_ms: 10,
            ceiling_ms: 40,
            multiplier: 2.0,
            jitter_factor: 0.0,
        },
        ..RealtimeConfig::default()
    }
}

#[tokio::test]
async fn persist_mode_gives_up_on_expired_refresh() {
    let tokens = Arc::new(ExpiredRefresh {
        refreshes: AtomicUsize::new(0),
    });
    let client = RealtimeClient::new(tokens.clone(), fast_persist());
    let causes = Arc::new(Mutex::new(Vec::new()));
    {
        let causes = causes.clone();
        client.on_disconnect(move |cause| causes.lock().push(cause.clone()));
    }
    let retries = Arc::new(AtomicUsize::new(0));
    {
        let retries = retries.clone();
        client.on_retry(move |_, _| {
            let _ = retries.fetch_add(1, Ordering::SeqCst);
        });
    }

    client.open().await.unwrap();
    eventually("supervisor to give up", || {
        client.status() == ConnectionStatus::Closed
    })
    .await;
    // Give a wrongly retrying supervisor time to show itself.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(tokens.refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(retries.load(Ordering::SeqCst), 0);
    assert_eq!(
        *causes.lock(),
        vec![RealtimeError::Session(SessionError::RefreshExpired)]
    );
    assert_eq!(
        client.last_error(),
        Some(RealtimeError::Session(SessionError::RefreshExpired))
    );
    assert_eq!(client.status(), ConnectionStatus::Closed);

    // A later open starts a fresh supervisor.
    client.open().await.unwrap();
    eventually("second give up", || {
        tokens.refreshes.load(Ordering::SeqCst) == 2
            && client.status() == ConnectionStatus::Closed
    })
    .await;
    client.close().await;
}

#[tokio::test]
async fn persist_mode_backoff_grows_then_caps() {
    let client = RealtimeClient::new(
        Arc::new(StaticTokenSource::new("http://127.0.0.1:1", "t")),
        fast_persist(),
    );
    let waits = Arc::new(Mutex::new(Vec::new()));
    {
        let waits = waits.clone();
        client.on_retry(move |attempt, delay| waits.lock().push((attempt, delay)));
    }

    client.open().await.unwrap();
    eventually("five redial waits", || waits.lock().len() >= 5).await;
    client.close().await;

    let waits: Vec<(u32, u64)> = waits
        .lock()
        .iter()
        .take(5)
        .map(|(attempt, delay)| (*attempt, u64::try_from(delay.as_millis()).unwrap()))
        .collect();
    assert_eq!(waits, vec![(1, 10), (2, 20), (3, 40), (4, 40), (5, 40)]);
    assert_matches!(client.last_error(), None);
    assert_eq!(client.status(), ConnectionStatus::Closed);
}

#[tokio::test]
async fn zero_queue_capacity_still_sends() {
    let server = FakeServer::start(Format::Binary, &[]).await;
    let client = client_for(
        &server,
        RealtimeConfig {
            outbound_queue_capacity: 0,
            ..RealtimeConfig::default()
        },
    );

    client.open().await.unwrap();
    client.ping().await.unwrap();
    client.close().await;
}
