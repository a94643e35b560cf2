//! The realtime connection.
//!
//! One [`RealtimeClient`] owns at most one live socket at a time. Each live
//! socket runs three tasks:
//!
//! - inbound: reads frames, resolves correlated replies, dispatches pushes
//! - outbound: drains the FIFO send queue, registering calls before writing
//! - keepalive: optional application-level pings
//!
//! In persist mode a supervisor task redials with backoff whenever the
//! socket is down. All tasks share state only through the correlation
//! table, the handler registry, the outbound queue and the live-connection
//! slot.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use arena_core::Backoff;
use arena_protocol::payloads::Ping;
use arena_protocol::{Envelope, ExpectedReply, Format, Message, decode, encode};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::RealtimeConfig;
use crate::correlation::{CallResult, CorrelationTable, PendingCall, ReplySlot};
use crate::dispatch::HandlerRegistry;
use crate::errors::{RealtimeError, Result};
use crate::socket::{self, DialParams, WsStream};
use crate::token::TokenSource;

/// Connection state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No socket and nothing trying to open one.
    #[default]
    Closed,
    /// Dialing, or waiting to redial.
    Connecting,
    /// A socket is live.
    Open,
}

type ConnectCallback = Arc<dyn Fn() + Send + Sync>;
type DisconnectCallback = Arc<dyn Fn(&RealtimeError) + Send + Sync>;
type RetryCallback = Arc<dyn Fn(u32, Duration) + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    on_connect: Option<ConnectCallback>,
    on_disconnect: Option<DisconnectCallback>,
    on_retry: Option<RetryCallback>,
}

/// A queued send.
struct Outbound {
    envelope: Envelope,
    expected: ExpectedReply,
    slot: ReplySlot,
    /// Set by the outbound task once the call is registered.
    cid: Arc<OnceLock<String>>,
}

struct LiveConnection {
    generation: u64,
    outbound: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
}

struct Supervisor {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    config: RealtimeConfig,
    tokens: Arc<dyn TokenSource>,
    table: CorrelationTable,
    handlers: HandlerRegistry,
    status: watch::Sender<ConnectionStatus>,
    live: Mutex<Option<LiveConnection>>,
    generation: AtomicU64,
    supervisor: Mutex<Option<Supervisor>>,
    callbacks: RwLock<Callbacks>,
    connect_lock: tokio::sync::Mutex<()>,
    last_error: Mutex<Option<RealtimeError>>,
}

/// Client for the realtime socket. Cheap to clone; clones share the
/// connection.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("status", &self.status())
            .field("pending", &self.inner.table.len())
            .field("handlers", &self.inner.handlers)
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    /// Create a closed client.
    pub fn new(tokens: Arc<dyn TokenSource>, config: RealtimeConfig) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Closed);
        Self {
            inner: Arc::new(Inner {
                config,
                tokens,
                table: CorrelationTable::new(),
                handlers: HandlerRegistry::new(),
                status,
                live: Mutex::new(None),
                generation: AtomicU64::new(0),
                supervisor: Mutex::new(None),
                callbacks: RwLock::new(Callbacks::default()),
                connect_lock: tokio::sync::Mutex::new(()),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Connection configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.inner.config
    }

    /// Push handler registry.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.inner.handlers
    }

    /// Current state.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    /// Number of calls waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        self.inner.table.len()
    }

    /// Run `f` each time a socket opens.
    pub fn on_connect<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.callbacks.write().on_connect = Some(Arc::new(f));
    }

    /// Run `f` with the cause each time a live socket goes away.
    pub fn on_disconnect<F>(&self, f: F)
    where
        F: Fn(&RealtimeError) + Send + Sync + 'static,
    {
        self.inner.callbacks.write().on_disconnect = Some(Arc::new(f));
    }

    /// Run `f` before each persist-mode redial wait, with the number of
    /// consecutive failures and the delay about to be slept.
    pub fn on_retry<F>(&self, f: F)
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.inner.callbacks.write().on_retry = Some(Arc::new(f));
    }

    /// The failure that last stopped an open attempt, cleared once a socket
    /// opens.
    pub fn last_error(&self) -> Option<RealtimeError> {
        self.inner.last_error.lock().clone()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Open the connection.
    ///
    /// Without persist mode this dials once and returns the dial's error.
    /// With persist mode it starts the supervisor and returns immediately.
    /// Transport failures are retried in the background; any other failure
    /// stops the supervisor, closes the client and is reported through
    /// [`on_disconnect`](Self::on_disconnect) and
    /// [`last_error`](Self::last_error).
    pub async fn open(&self) -> Result<()> {
        if self.status() == ConnectionStatus::Open {
            return Ok(());
        }
        if self.inner.config.persist {
            let mut supervisor = self.inner.supervisor.lock();
            if supervisor.is_none() {
                self.inner.set_status(ConnectionStatus::Connecting);
                let stop = CancellationToken::new();
                let handle = tokio::spawn(supervise(self.clone(), stop.clone()));
                *supervisor = Some(Supervisor { stop, handle });
            }
            return Ok(());
        }

        self.inner.set_status(ConnectionStatus::Connecting);
        match self.connect_once().await {
            Ok(()) => Ok(()),
            Err(e) => {
                if self.inner.live.lock().is_none() {
                    self.inner.set_status(ConnectionStatus::Closed);
                }
                *self.inner.last_error.lock() = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Stop the supervisor and close the live socket. Idempotent.
    ///
    /// Every pending call fails with [`RealtimeError::ConnectionClosed`].
    pub async fn close(&self) {
        let supervisor = {
            let mut slot = self.inner.supervisor.lock();
            if let Some(supervisor) = slot.as_ref() {
                supervisor.stop.cancel();
            }
            slot.take()
        };
        if let Some(supervisor) = supervisor {
            if let Err(e) = supervisor.handle.await {
                warn!(error = %e, "supervisor task failed");
            }
        }
        let generation = self.inner.live.lock().as_ref().map(|live| live.generation);
        if let Some(generation) = generation {
            self.inner.teardown(generation, &RealtimeError::ConnectionClosed);
        }
        self.inner.set_status(ConnectionStatus::Closed);
    }

    /// Close, then forget the session so the next open needs a new one.
    pub async fn close_and_clear(&self) {
        self.close().await;
        self.inner.tokens.clear_session();
    }

    async fn connect_once(&self) -> Result<()> {
        let _guard = self.inner.connect_lock.lock().await;
        if self.inner.live.lock().is_some() {
            return Ok(());
        }
        let config = &self.inner.config;
        let token = match &config.token_override {
            Some(token) => token.clone(),
            None => {
                self.inner.tokens.refresh_session().await?;
                self.inner.tokens.current_token().await?
            }
        };
        let base = config
            .url_override
            .clone()
            .unwrap_or_else(|| self.inner.tokens.base_socket_url());
        let url = socket::socket_url(
            &base,
            &DialParams {
                token: &token,
                format: config.format,
                lang: config.lang.as_deref(),
                appear_online: config.appear_online,
            },
        )?;
        let ws = socket::dial(&url, config.connect_timeout).await?;
        self.install(ws);
        Ok(())
    }

    fn install(&self, ws: WsStream) {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (sink, stream) = ws.split();
        let (tx, rx) = mpsc::channel(inner.config.outbound_queue_capacity.max(1));
        let cancel = CancellationToken::new();

        *inner.live.lock() = Some(LiveConnection {
            generation,
            outbound: tx,
            cancel: cancel.clone(),
        });

        drop(tokio::spawn(outbound_loop(
            inner.clone(),
            generation,
            sink,
            rx,
            cancel.clone(),
        )));
        drop(tokio::spawn(inbound_loop(
            inner.clone(),
            generation,
            stream,
            cancel.clone(),
        )));
        if let Some(interval) = inner.config.ping_interval {
            drop(tokio::spawn(keepalive_loop(
                self.clone(),
                generation,
                interval,
                cancel,
            )));
        }

        *inner.last_error.lock() = None;
        inner.set_status(ConnectionStatus::Open);
        info!(generation, format = ?inner.config.format, "connection open");
        let on_connect = inner.callbacks.read().on_connect.clone();
        if let Some(callback) = on_connect {
            callback();
        }
    }

    // ─── Sending ─────────────────────────────────────────────────────────

    /// Send a request and wait for its reply, bounded by the configured
    /// request timeout.
    ///
    /// Returns the reply payload, or `None` for requests answered with an
    /// empty acknowledgement or not answered at all.
    pub async fn send(&self, envelope: Envelope) -> Result<Option<Message>> {
        self.send_with_cancel(envelope, &CancellationToken::new())
            .await
    }

    /// Like [`send`](Self::send), but also gives up when `cancel` fires.
    ///
    /// Cancelling fails only this call; the socket stays open.
    pub async fn send_with_cancel(
        &self,
        envelope: Envelope,
        cancel: &CancellationToken,
    ) -> Result<Option<Message>> {
        self.request(envelope, self.inner.config.request_timeout, cancel)
            .await
    }

    /// Run `call` on a task and hand its result to `callback`.
    #[allow(clippy::unused_self)]
    pub fn spawn_call<Fut, T, F>(&self, call: Fut, callback: F) -> JoinHandle<()>
    where
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        tokio::spawn(async move { callback(call.await) })
    }

    async fn request(
        &self,
        mut envelope: Envelope,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> CallResult {
        let kind = envelope
            .kind()
            .ok_or_else(|| RealtimeError::InvalidRequest("envelope has no message".into()))?;
        let expected = kind
            .expected_reply()
            .ok_or_else(|| RealtimeError::InvalidRequest(format!("{kind} is not a request")))?;
        let outbound = self
            .inner
            .live
            .lock()
            .as_ref()
            .map(|live| live.outbound.clone())
            .ok_or(RealtimeError::NotConnected)?;

        envelope.cid.clear();
        let (slot, reply) = oneshot::channel();
        let cid = Arc::new(OnceLock::new());
        let item = Outbound {
            envelope,
            expected,
            slot,
            cid: cid.clone(),
        };
        let wait = async move {
            if outbound.send(item).await.is_err() {
                return Err(RealtimeError::ConnectionClosed);
            }
            reply.await.unwrap_or(Err(RealtimeError::ConnectionClosed))
        };
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        let err = tokio::select! {
            result = wait => return result,
            () = cancel.cancelled() => RealtimeError::Cancelled,
            () = deadline => RealtimeError::Timeout(
                timeout.map_or(0, |t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX)),
            ),
        };
        // The reply receiver is gone by now. If the outbound task has not
        // registered the call yet it will see the closed slot and drop it.
        if let Some(cid) = cid.get() {
            let _ = self.inner.table.cancel(cid, err.clone());
        }
        debug!(%kind, error = %err, "call abandoned");
        Err(err)
    }
}

impl Inner {
    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(from = ?previous, to = ?status, "status changed");
        }
    }

    /// Tear down the socket `generation` if it is still the live one.
    fn teardown(&self, generation: u64, cause: &RealtimeError) {
        let live = {
            let mut live = self.live.lock();
            if live.as_ref().is_some_and(|l| l.generation == generation) {
                live.take()
            } else {
                None
            }
        };
        let Some(live) = live else {
            return;
        };
        live.cancel.cancel();
        let drained = self.table.drain_all(&RealtimeError::ConnectionClosed);
        info!(generation, cause = %cause, drained, "connection closed");

        let next = if self.supervisor.lock().is_some() {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Closed
        };
        self.set_status(next);

        let on_disconnect = self.callbacks.read().on_disconnect.clone();
        if let Some(callback) = on_disconnect {
            callback(cause);
        }
    }

    fn frame(&self, envelope: &Envelope) -> Result<Frame> {
        let bytes = encode(envelope, self.config.format)?;
        Ok(match self.config.format {
            Format::Binary => Frame::Binary(bytes.into()),
            Format::Text => Frame::Text(
                String::from_utf8(bytes)
                    .map_err(|e| RealtimeError::Codec(e.to_string()))?
                    .into(),
            ),
        })
    }

    /// Write one queued item. An error means the socket is unusable.
    async fn write(
        &self,
        sink: &mut SplitSink<WsStream, Frame>,
        item: Outbound,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Outbound {
            mut envelope,
            expected,
            slot,
            cid,
        } = item;

        if expected == ExpectedReply::NoReply {
            if slot.is_closed() {
                return Ok(());
            }
            let frame = match self.frame(&envelope) {
                Ok(frame) => frame,
                Err(e) => {
                    let _ = slot.send(Err(e));
                    return Ok(());
                }
            };
            return match sink.send(frame).await {
                Ok(()) => {
                    let _ = slot.send(Ok(None));
                    Ok(())
                }
                Err(e) => {
                    let err = RealtimeError::Write(e.to_string());
                    let _ = slot.send(Err(err.clone()));
                    Err(err)
                }
            };
        }

        let id = self.table.register(PendingCall::new(expected, slot));
        let _ = cid.set(id.clone());
        if self.table.cancel_if_abandoned(&id) {
            return Ok(());
        }
        if cancel.is_cancelled() {
            let _ = self.table.cancel(&id, RealtimeError::ConnectionClosed);
            return Ok(());
        }

        envelope.cid = id.clone();
        let frame = match self.frame(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                let _ = self.table.cancel(&id, e);
                return Ok(());
            }
        };
        trace!(cid = %id, kind = ?envelope.kind(), "writing request");
        if let Err(e) = sink.send(frame).await {
            let err = RealtimeError::Write(e.to_string());
            let _ = self.table.cancel(&id, err.clone());
            return Err(err);
        }
        Ok(())
    }

    fn on_frame(&self, payload: &[u8]) {
        let envelope = match decode(payload, self.config.format) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, len = payload.len(), "dropping undecodable frame");
                return;
            }
        };
        if envelope.has_cid() {
            // Unknown ids are logged by the table.
            let _ = self.table.resolve(envelope);
        } else {
            let _ = self.handlers.dispatch(envelope);
        }
    }
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

async fn outbound_loop(
    inner: Arc<Inner>,
    generation: u64,
    mut sink: SplitSink<WsStream, Frame>,
    mut queue: mpsc::Receiver<Outbound>,
    cancel: CancellationToken,
) {
    loop {
        let item = tokio::select! {
            () = cancel.cancelled() => break,
            item = queue.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };
        if let Err(cause) = inner.write(&mut sink, item, &cancel).await {
            inner.teardown(generation, &cause);
            break;
        }
    }

    if let Err(e) = sink.close().await {
        debug!(generation, error = %e, "socket close failed");
    }
    queue.close();
    while let Ok(item) = queue.try_recv() {
        let _ = item.slot.send(Err(RealtimeError::ConnectionClosed));
    }
}

async fn inbound_loop(
    inner: Arc<Inner>,
    generation: u64,
    mut stream: SplitStream<WsStream>,
    cancel: CancellationToken,
) {
    let cause = loop {
        let next = tokio::select! {
            () = cancel.cancelled() => return,
            next = stream.next() => next,
        };
        match next {
            None => break RealtimeError::Read("stream ended".into()),
            Some(Err(e)) => break RealtimeError::Read(e.to_string()),
            Some(Ok(Frame::Close(frame))) => {
                let reason = frame.map_or_else(
                    || "closed by peer".to_string(),
                    |f| format!("closed by peer: {} {}", u16::from(f.code), f.reason.as_str()),
                );
                break RealtimeError::Read(reason);
            }
            Some(Ok(Frame::Binary(bytes))) if bytes.is_empty() => {
                break RealtimeError::Read("empty frame".into());
            }
            Some(Ok(Frame::Text(text))) if text.is_empty() => {
                break RealtimeError::Read("empty frame".into());
            }
            Some(Ok(Frame::Binary(bytes))) => inner.on_frame(&bytes),
            Some(Ok(Frame::Text(text))) => inner.on_frame(text.as_bytes()),
            Some(Ok(Frame::Ping(_) | Frame::Pong(_) | Frame::Frame(_))) => {}
        }
    };
    inner.teardown(generation, &cause);
}

async fn keepalive_loop(
    client: RealtimeClient,
    generation: u64,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately.
    let _ = ticker.tick().await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        match client
            .request(Envelope::request(Ping {}), Some(interval), &cancel)
            .await
        {
            Ok(_) => trace!(generation, "pong"),
            Err(
                RealtimeError::Cancelled
                | RealtimeError::ConnectionClosed
                | RealtimeError::NotConnected,
            ) => return,
            Err(e) => {
                warn!(generation, error = %e, "keepalive failed");
                client
                    .inner
                    .teardown(generation, &RealtimeError::Read("ping timeout".into()));
                return;
            }
        }
    }
}

async fn supervise(client: RealtimeClient, stop: CancellationToken) {
    let inner = client.inner.clone();
    let mut backoff = Backoff::new(inner.config.backoff.clone());
    let mut was_open = false;
    let mut failures: u32 = 0;
    info!("reconnect supervisor started");

    loop {
        if stop.is_cancelled() {
            break;
        }
        if inner.live.lock().is_some() {
            was_open = true;
            tokio::select! {
                () = stop.cancelled() => break,
                () = tokio::time::sleep(inner.config.poll_interval) => continue,
            }
        }
        if was_open {
            backoff.reset();
            failures = 0;
            was_open = false;
        }

        inner.set_status(ConnectionStatus::Connecting);
        let attempt = tokio::select! {
            () = stop.cancelled() => break,
            attempt = client.connect_once() => attempt,
        };
        match attempt {
            Ok(()) => {
                backoff.reset();
                failures = 0;
            }
            Err(e) if e.is_retryable() => {
                let delay = backoff.delay();
                failures = failures.saturating_add(1);
                warn!(
                    error = %e,
                    attempt = failures,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "connect failed, retrying"
                );
                let on_retry = inner.callbacks.read().on_retry.clone();
                if let Some(callback) = on_retry {
                    callback(failures, delay);
                }
                backoff.advance();
                tokio::select! {
                    () = stop.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "connect failed, giving up");
                give_up(&inner, &stop, &e);
                break;
            }
        }
    }
    info!("reconnect supervisor stopped");
}

/// Stop persist mode after a failure redialing cannot fix.
///
/// `close` cancels `stop` while holding the slot, so an uncancelled token
/// means the slot still holds this supervisor.
fn give_up(inner: &Inner, stop: &CancellationToken, cause: &RealtimeError) {
    {
        let mut slot = inner.supervisor.lock();
        if stop.is_cancelled() {
            return;
        }
        // Dropping the handle detaches this task, which is about to return.
        drop(slot.take());
        *inner.last_error.lock() = Some(cause.clone());
        inner.set_status(ConnectionStatus::Closed);
    }
    let on_disconnect = inner.callbacks.read().on_disconnect.clone();
    if let Some(callback) = on_disconnect {
        callback(cause);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
