//! Persistent-connection ownership: connect, bounded-backoff reconnect, and
//! typed dispatch of pushed events.
//!
//! ARCHITECTURE
//! ============
//! At most one live socket is permitted. Every `connect()` bumps an epoch
//! counter; reader loops, writer tasks and pending reconnects all carry the
//! epoch they were created under and go inert the moment it changes, so a
//! manual reconnect can never leave a duplicate socket delivering duplicate
//! events. Outgoing commands flow through an unbounded channel to a writer
//! task (so `send` is non-blocking and safe to call from dispatch
//! callbacks); incoming text frames are decoded and fanned out through the
//! [`Dispatcher`]. A malformed frame is logged and dropped, never fatal.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use wire::{ClientCommand, EventKind, ServerEvent, decode_event, encode_command};

use crate::backoff::BackoffPolicy;
use crate::dispatch::{Dispatcher, SubscriptionToken};
use crate::error::CoordinatorError;

type WsSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type LifecycleCallback = Arc<dyn Fn(&ConnectionManager) + Send + Sync>;

/// Connection lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Owns the single live websocket handle for a session.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    policy: BackoffPolicy,
    epoch: AtomicU64,
    state: Mutex<ConnectionState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<ClientCommand>>>,
    dispatcher: Dispatcher,
    on_open: Mutex<Vec<LifecycleCallback>>,
    on_close: Mutex<Vec<LifecycleCallback>>,
}

impl ConnectionManager {
    #[must_use]
    pub fn new(url: String, policy: BackoffPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                url,
                policy,
                epoch: AtomicU64::new(0),
                state: Mutex::new(ConnectionState::Disconnected),
                outbound: Mutex::new(None),
                dispatcher: Dispatcher::default(),
                on_open: Mutex::new(Vec::new()),
                on_close: Mutex::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Register a callback for decoded events of one kind.
    pub fn subscribe(
        &self,
        kind: EventKind,
        callback: impl Fn(&ServerEvent) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        self.inner.dispatcher.subscribe(kind, callback)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) {
        self.inner.dispatcher.unsubscribe(token);
    }

    /// Register a callback fired after every successful open, automatic
    /// reconnects included.
    pub fn on_open(&self, callback: impl Fn(&Self) + Send + Sync + 'static) {
        self.inner.on_open.lock().push(Arc::new(callback));
    }

    /// Register a callback fired when an open transport drops (not on
    /// deliberate teardown).
    pub fn on_close(&self, callback: impl Fn(&Self) + Send + Sync + 'static) {
        self.inner.on_close.lock().push(Arc::new(callback));
    }

    /// Open the persistent connection, releasing any existing handle first.
    ///
    /// Resolves once the transport reports open. On success the reconnect
    /// loop takes over: an abrupt close is retried with linearly growing
    /// delays until the attempt cap is spent, after which the connection
    /// stays `Disconnected` until someone calls `connect()` again.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::Transport`] when the transport fails
    /// before opening. Such a failure does not start the reconnect loop;
    /// retrying it is the caller's (typically the supervisor's) decision.
    pub async fn connect(&self) -> Result<(), CoordinatorError> {
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.drop_transport();
        *self.inner.state.lock() = ConnectionState::Connecting;

        match connect_async(self.inner.url.as_str()).await {
            Ok((socket, _response)) => {
                let Some(stream) = self.install_transport(epoch, socket) else {
                    return Ok(());
                };
                self.fire(&self.inner.on_open);
                let manager = self.clone();
                tokio::spawn(async move { manager.drive(epoch, stream).await });
                Ok(())
            }
            Err(error) => {
                if self.is_current(epoch) {
                    *self.inner.state.lock() = ConnectionState::Disconnected;
                }
                Err(error.into())
            }
        }
    }

    /// Transmit a command if the connection is open; otherwise a logged
    /// no-op. Callers observe connectivity through the supervisor and
    /// occupancy, never through send results.
    pub fn send(&self, command: &ClientCommand) {
        let delivered = self
            .inner
            .outbound
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(command.clone()).is_ok());
        if !delivered {
            warn!(?command, "dropping command, connection not open");
        }
    }

    /// Full teardown: close the transport if present and clear every
    /// subscriber and lifecycle registration.
    pub fn disconnect(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        self.drop_transport();
        self.inner.dispatcher.clear();
        self.inner.on_open.lock().clear();
        self.inner.on_close.lock().clear();
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.inner.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Drop the outgoing channel (the writer task then closes the socket)
    /// and mark the connection down.
    fn drop_transport(&self) {
        self.inner.outbound.lock().take();
        *self.inner.state.lock() = ConnectionState::Disconnected;
    }

    /// Wire a freshly opened socket into the manager. Returns `None` when a
    /// newer `connect()` superseded this epoch mid-handshake, in which case
    /// the socket is simply dropped.
    fn install_transport(&self, epoch: u64, socket: WsSocket) -> Option<SplitStream<WsSocket>> {
        let (sink, stream) = socket.split();
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut outbound = self.inner.outbound.lock();
            if !self.is_current(epoch) {
                debug!("discarding socket opened under a stale epoch");
                return None;
            }
            *outbound = Some(tx);
            *self.inner.state.lock() = ConnectionState::Connected;
        }
        tokio::spawn(write_loop(rx, sink));
        Some(stream)
    }

    fn fire(&self, callbacks: &Mutex<Vec<LifecycleCallback>>) {
        let callbacks: Vec<LifecycleCallback> = callbacks.lock().clone();
        for callback in callbacks {
            callback(self);
        }
    }

    /// Per-connection task: read until the transport drops, then redial with
    /// bounded backoff. Exits when the epoch goes stale or the cap is spent.
    async fn drive(&self, epoch: u64, mut stream: SplitStream<WsSocket>) {
        loop {
            self.read_until_close(epoch, &mut stream).await;
            if !self.is_current(epoch) {
                return;
            }
            self.drop_transport();
            self.fire(&self.inner.on_close);
            debug!("transport closed, reconnecting with backoff");

            let Some(socket) = self.redial(epoch).await else {
                return;
            };
            let Some(next) = self.install_transport(epoch, socket) else {
                return;
            };
            stream = next;
            self.fire(&self.inner.on_open);
        }
    }

    async fn read_until_close(&self, epoch: u64, stream: &mut SplitStream<WsSocket>) {
        while let Some(message) = stream.next().await {
            if !self.is_current(epoch) {
                return;
            }
            match message {
                Ok(Message::Text(text)) => match decode_event(text.as_str()) {
                    Ok(event) => self.inner.dispatcher.dispatch(&event),
                    Err(error) => warn!(%error, "dropping undecodable frame"),
                },
                Ok(Message::Close(_)) => return,
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "websocket read failed");
                    return;
                }
            }
        }
    }

    async fn redial(&self, epoch: u64) -> Option<WsSocket> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(delay) = self.inner.policy.delay_for(attempt) else {
                warn!(
                    attempts = self.inner.policy.max_attempts(),
                    "reconnect cap exhausted, waiting for a manual connect"
                );
                return None;
            };
            tokio::time::sleep(delay).await;
            if !self.is_current(epoch) {
                return None;
            }
            *self.inner.state.lock() = ConnectionState::Connecting;
            match connect_async(self.inner.url.as_str()).await {
                Ok((socket, _response)) => return Some(socket),
                Err(error) => {
                    debug!(%error, attempt, "reconnect attempt failed");
                    if self.is_current(epoch) {
                        *self.inner.state.lock() = ConnectionState::Disconnected;
                    }
                }
            }
        }
    }
}

async fn write_loop(
    mut rx: mpsc::UnboundedReceiver<ClientCommand>,
    mut sink: SplitSink<WsSocket, Message>,
) {
    while let Some(command) = rx.recv().await {
        let text = encode_command(&command);
        if let Err(error) = sink.send(Message::Text(text.into())).await {
            warn!(%error, "websocket send failed");
            break;
        }
    }
    // channel closed: deliberate teardown, or the transport died underneath
    let _ = sink.close().await;
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
