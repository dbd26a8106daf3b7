//! In-process collaborators for coordinator integration tests: a scripted
//! request/response authority and a websocket stub server speaking the
//! realtime protocol.

// each test binary uses a different slice of this module
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use coordinator::{BoardSnapshot, CoordinatorError, MoveReply, SessionApi, SessionRecord};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use wire::{Board, ClientCommand, GameStatus, Position, ServerEvent};

/// Poll `condition` until it holds or a deadline passes.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ── Scripted request/response authority ─────────────────────────────────

/// Scripted [`SessionApi`]: hands out canned session records, a settable
/// board snapshot, and queued move replies, while counting every call.
pub struct ScriptedSessionApi {
    session_id: String,
    player_x: Mutex<Option<String>>,
    player_o: Mutex<Option<String>>,
    status: Mutex<GameStatus>,
    board: Mutex<BoardSnapshot>,
    move_replies: Mutex<VecDeque<Result<MoveReply, String>>>,
    submit_calls: AtomicUsize,
    board_calls: AtomicUsize,
}

impl ScriptedSessionApi {
    pub fn new(session_id: &str) -> Arc<Self> {
        Arc::new(Self {
            session_id: session_id.to_owned(),
            player_x: Mutex::new(None),
            player_o: Mutex::new(None),
            status: Mutex::new(GameStatus::Waiting),
            board: Mutex::new(BoardSnapshot {
                board: Board::empty(),
                winner: None,
            }),
            move_replies: Mutex::new(VecDeque::new()),
            submit_calls: AtomicUsize::new(0),
            board_calls: AtomicUsize::new(0),
        })
    }

    /// Pre-seed the roles, for join/resume flows.
    pub fn seed_roles(&self, player_x: Option<&str>, player_o: Option<&str>) {
        *self.player_x.lock() = player_x.map(ToOwned::to_owned);
        *self.player_o.lock() = player_o.map(ToOwned::to_owned);
    }

    pub fn set_status(&self, status: GameStatus) {
        *self.status.lock() = status;
    }

    /// What the board read endpoint will answer from now on.
    pub fn set_board_snapshot(&self, snapshot: BoardSnapshot) {
        *self.board.lock() = snapshot;
    }

    pub fn queue_move_reply(&self, reply: MoveReply) {
        self.move_replies.lock().push_back(Ok(reply));
    }

    pub fn queue_move_rejection(&self, message: &str) {
        self.move_replies.lock().push_back(Err(message.to_owned()));
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn board_calls(&self) -> usize {
        self.board_calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> SessionRecord {
        SessionRecord {
            id: self.session_id.clone(),
            status: *self.status.lock(),
            player_x: self.player_x.lock().clone(),
            player_o: self.player_o.lock().clone(),
        }
    }
}

#[async_trait]
impl SessionApi for ScriptedSessionApi {
    async fn create_session(&self, player_id: &str) -> Result<SessionRecord, CoordinatorError> {
        *self.player_x.lock() = Some(player_id.to_owned());
        Ok(self.record())
    }

    async fn join_session(
        &self,
        _session_id: &str,
        player_id: &str,
    ) -> Result<SessionRecord, CoordinatorError> {
        *self.player_o.lock() = Some(player_id.to_owned());
        Ok(self.record())
    }

    async fn get_session(&self, _session_id: &str) -> Result<SessionRecord, CoordinatorError> {
        Ok(self.record())
    }

    async fn get_board(&self, _session_id: &str) -> Result<BoardSnapshot, CoordinatorError> {
        self.board_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.board.lock().clone())
    }

    async fn submit_move(
        &self,
        _session_id: &str,
        _player_id: &str,
        _position: Position,
    ) -> Result<MoveReply, CoordinatorError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        match self.move_replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(CoordinatorError::Rejected { message }),
            None => panic!("unscripted move submission"),
        }
    }
}

// ── Websocket stub server ───────────────────────────────────────────────

enum Directive {
    Event(ServerEvent),
    Raw(String),
    Close,
}

/// Minimal realtime authority: records every room command, auto-replies to
/// create/join with the configured occupancy, and lets tests push arbitrary
/// events or drop the connection.
pub struct StubServer {
    addr: SocketAddr,
    accept_task: JoinHandle<()>,
    shared: Arc<StubShared>,
}

struct StubShared {
    commands: Mutex<Vec<ClientCommand>>,
    connections: Mutex<Vec<mpsc::UnboundedSender<Directive>>>,
    accepted: AtomicUsize,
    room_players: AtomicUsize,
}

impl StubServer {
    pub async fn spawn() -> Self {
        Self::spawn_at("127.0.0.1:0".parse().expect("stub bind address")).await
    }

    /// Bind a specific address, for tests that bring the authority up
    /// *after* a client already points at it.
    pub async fn spawn_at(bind: SocketAddr) -> Self {
        let listener = TcpListener::bind(bind).await.expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let shared = Arc::new(StubShared {
            commands: Mutex::new(Vec::new()),
            connections: Mutex::new(Vec::new()),
            accepted: AtomicUsize::new(0),
            room_players: AtomicUsize::new(1),
        });

        let accept_shared = Arc::clone(&shared);
        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let shared = Arc::clone(&accept_shared);
                tokio::spawn(handle_connection(stream, shared));
            }
        });

        Self {
            addr,
            accept_task,
            shared,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Occupancy reported by the auto-replies to create/join commands.
    pub fn set_room_players(&self, players: usize) {
        self.shared.room_players.store(players, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<ClientCommand> {
        self.shared.commands.lock().clone()
    }

    /// Number of websocket connections accepted so far.
    pub fn connections(&self) -> usize {
        self.shared.accepted.load(Ordering::SeqCst)
    }

    /// Push an event to the most recent connection.
    pub fn push(&self, event: ServerEvent) {
        self.direct(Directive::Event(event));
    }

    /// Push a raw text frame (for malformed-frame tests).
    pub fn push_raw(&self, text: &str) {
        self.direct(Directive::Raw(text.to_owned()));
    }

    /// Close the most recent connection from the server side.
    pub fn drop_connection(&self) {
        self.direct(Directive::Close);
    }

    /// Stop accepting new connections and drop every live one.
    pub fn shutdown(&self) {
        self.accept_task.abort();
        self.shared.connections.lock().clear();
    }

    fn direct(&self, directive: Directive) {
        let connections = self.shared.connections.lock();
        let sender = connections.last().expect("no stub connection yet");
        sender.send(directive).expect("stub connection gone");
    }
}

async fn handle_connection(stream: TcpStream, shared: Arc<StubShared>) {
    let Ok(socket) = accept_async(stream).await else {
        return;
    };
    shared.accepted.fetch_add(1, Ordering::SeqCst);

    let (tx, mut rx) = mpsc::unbounded_channel::<Directive>();
    shared.connections.lock().push(tx.clone());

    let (mut sink, mut source) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(directive) = rx.recv().await {
            let outcome = match directive {
                Directive::Event(event) => {
                    let text = serde_json::to_string(&event).expect("serialize event");
                    sink.send(Message::Text(text.into())).await
                }
                Directive::Raw(text) => sink.send(Message::Text(text.into())).await,
                Directive::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if outcome.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = source.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(command) = serde_json::from_str::<ClientCommand>(text.as_str()) else {
            continue;
        };
        shared.commands.lock().push(command.clone());

        // auto-reply with the configured occupancy, like the authority does
        let players = shared.room_players.load(Ordering::SeqCst) as u32;
        let reply = match command {
            ClientCommand::CreateRoom { room_id } => ServerEvent::RoomCreated { room_id, players },
            ClientCommand::JoinRoom { room_id } => ServerEvent::RoomJoined { room_id, players },
        };
        if tx.send(Directive::Event(reply)).is_err() {
            break;
        }
    }

    writer.abort();
}
