//! Session facade: constructs and wires every coordinator component.
//!
//! ARCHITECTURE
//! ============
//! One [`GameClient`] is built at the top of the call graph per session and
//! injected into whatever consumes it; there is no global session store.
//! Consumers see only the typed surface ([`SessionView`] snapshots plus the
//! operations below), never the internal representation. `Finished` is
//! terminal: to play again, build a new client.

use std::sync::Arc;

use tracing::{debug, warn};
use wire::{EventKind, Mark, ServerEvent};

use crate::api::{HttpSessionApi, SessionApi, SessionRecord};
use crate::config::ClientConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::CoordinatorError;
use crate::gate::MoveGate;
use crate::room::RoomCoordinator;
use crate::session::{AuthoritativeUpdate, SessionState, SessionView, SharedSession};
use crate::supervisor::RetrySupervisor;

/// Coordinates one two-participant game session end to end.
pub struct GameClient {
    session: SharedSession,
    connection: ConnectionManager,
    supervisor: RetrySupervisor,
    gate: MoveGate,
}

impl GameClient {
    /// Create a brand-new session; the local participant plays `X`.
    ///
    /// # Errors
    ///
    /// Fails when the request/response channel refuses the creation or the
    /// configuration is unusable. An initial transport failure is *not*
    /// fatal; the supervisor keeps retrying.
    pub async fn create_session(
        config: ClientConfig,
        player_id: &str,
    ) -> Result<Self, CoordinatorError> {
        let api: Arc<dyn SessionApi> = Arc::new(HttpSessionApi::new(&config)?);
        Self::create_session_with(config, player_id, api).await
    }

    /// Like [`Self::create_session`] with an explicit collaborator.
    ///
    /// # Errors
    ///
    /// See [`Self::create_session`].
    pub async fn create_session_with(
        config: ClientConfig,
        player_id: &str,
        api: Arc<dyn SessionApi>,
    ) -> Result<Self, CoordinatorError> {
        let record = api.create_session(player_id).await?;
        Self::start(config, record, player_id, Some(Mark::X), api).await
    }

    /// Join an existing session; the local participant plays `O`.
    ///
    /// # Errors
    ///
    /// Fails when the join is refused or the configuration is unusable.
    pub async fn join_session(
        config: ClientConfig,
        session_id: &str,
        player_id: &str,
    ) -> Result<Self, CoordinatorError> {
        let api: Arc<dyn SessionApi> = Arc::new(HttpSessionApi::new(&config)?);
        Self::join_session_with(config, session_id, player_id, api).await
    }

    /// Like [`Self::join_session`] with an explicit collaborator.
    ///
    /// # Errors
    ///
    /// See [`Self::join_session`].
    pub async fn join_session_with(
        config: ClientConfig,
        session_id: &str,
        player_id: &str,
        api: Arc<dyn SessionApi>,
    ) -> Result<Self, CoordinatorError> {
        let record = api.join_session(session_id, player_id).await?;
        Self::start(config, record, player_id, Some(Mark::O), api).await
    }

    /// Load a session this participant already belongs to (fresh process,
    /// existing game). The local mark is derived from the role assignment.
    ///
    /// # Errors
    ///
    /// Fails when the session cannot be loaded or the participant holds no
    /// role in it.
    pub async fn resume_session(
        config: ClientConfig,
        session_id: &str,
        player_id: &str,
    ) -> Result<Self, CoordinatorError> {
        let api: Arc<dyn SessionApi> = Arc::new(HttpSessionApi::new(&config)?);
        Self::resume_session_with(config, session_id, player_id, api).await
    }

    /// Like [`Self::resume_session`] with an explicit collaborator.
    ///
    /// # Errors
    ///
    /// See [`Self::resume_session`].
    pub async fn resume_session_with(
        config: ClientConfig,
        session_id: &str,
        player_id: &str,
        api: Arc<dyn SessionApi>,
    ) -> Result<Self, CoordinatorError> {
        let record = api.get_session(session_id).await?;
        Self::start(config, record, player_id, None, api).await
    }

    async fn start(
        config: ClientConfig,
        record: SessionRecord,
        player_id: &str,
        mark: Option<Mark>,
        api: Arc<dyn SessionApi>,
    ) -> Result<Self, CoordinatorError> {
        let ws_url = config.websocket_url()?;

        let mut state = SessionState::new(record.id.clone(), player_id);
        state.set_players(record.player_x.clone(), record.player_o.clone());
        state.restore_status(record.status);
        match mark {
            Some(mark) => state.assign_mark(mark)?,
            None => {
                state.derive_local_mark()?;
            }
        }
        let session = state.into_shared();

        let connection = ConnectionManager::new(ws_url, config.backoff_policy());
        let room = RoomCoordinator::new(Arc::clone(&session));
        let supervisor = RetrySupervisor::new(
            config.poll_interval,
            Arc::clone(&session),
            connection.clone(),
            room.clone(),
        );
        let gate = MoveGate::new(Arc::clone(&session), Arc::clone(&api));

        let client = Self {
            session,
            connection,
            supervisor,
            gate,
        };
        client.register_handlers(&room, &api);

        // room membership is connection-scoped, so the session only becomes
        // live once the first connect lands; the supervisor repairs any
        // failure here on its next tick
        if let Err(error) = client.connection.connect().await {
            warn!(%error, "initial connect failed, supervisor will retry");
        }
        client.supervisor.ensure();
        Ok(client)
    }

    /// Install the dispatch and lifecycle observers.
    fn register_handlers(&self, room: &RoomCoordinator, api: &Arc<dyn SessionApi>) {
        // exactly one room command per successful open, reconnects included
        let issuer = room.clone();
        self.connection
            .on_open(move |connection| issuer.issue(connection));

        // authoritative refresh after every open: moves played while this
        // client was offline would otherwise stay stale until the next push
        let refresh_api = Arc::clone(api);
        let refresh_session = Arc::clone(&self.session);
        self.connection.on_open(move |_connection| {
            let api = Arc::clone(&refresh_api);
            let session = Arc::clone(&refresh_session);
            tokio::spawn(async move {
                let session_id = session.lock().id().to_owned();
                match api.get_board(&session_id).await {
                    Ok(snapshot) => session.lock().refresh_board(snapshot.board, snapshot.winner),
                    Err(error) => debug!(%error, "board refresh after open failed"),
                }
            });
        });

        // a dropped transport re-arms the watchdog
        let watchdog = self.supervisor.clone();
        self.connection.on_close(move |_connection| watchdog.ensure());

        // occupancy mirror
        for kind in [
            EventKind::RoomCreated,
            EventKind::RoomJoined,
            EventKind::PlayerJoined,
        ] {
            let session = Arc::clone(&self.session);
            let watchdog = self.supervisor.clone();
            self.connection.subscribe(kind, move |event| {
                if let Some(players) = event.players() {
                    session.lock().set_occupancy(players);
                    watchdog.ensure();
                }
            });
        }

        // start of play
        let session = Arc::clone(&self.session);
        self.connection
            .subscribe(EventKind::GameStarted, move |event| {
                if let ServerEvent::GameStarted { status, .. } = event {
                    session.lock().begin_game(*status);
                }
            });

        // broadcast moves: the other participant's accepted moves (and the
        // echo of our own) replace the mirrored fields wholesale
        let session = Arc::clone(&self.session);
        self.connection.subscribe(EventKind::MoveMade, move |event| {
            if let ServerEvent::MoveMade {
                board,
                winner,
                game_status,
                symbol,
                ..
            } = event
            {
                session.lock().apply_authoritative(AuthoritativeUpdate {
                    board: *board,
                    outcome: *winner,
                    status: *game_status,
                    next_turn: symbol.other(),
                });
            }
        });
    }

    /// Read-only snapshot of the mirrored session.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.session.lock().view()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether the repair watchdog is currently running.
    #[must_use]
    pub fn supervisor_active(&self) -> bool {
        self.supervisor.is_active()
    }

    /// Attempt a move at `(row, col)`. See [`MoveGate::attempt_move`].
    ///
    /// # Errors
    ///
    /// Local rejections surface as [`CoordinatorError::IllegalMove`] without
    /// a network call; authoritative refusals as
    /// [`CoordinatorError::Rejected`] without local mutation.
    pub async fn attempt_move(&self, row: u8, col: u8) -> Result<SessionView, CoordinatorError> {
        self.gate.attempt_move(row, col).await
    }

    /// User-triggered recovery: tear down any existing socket, dial once,
    /// re-issue the room command, and re-arm the watchdog.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the dial fails.
    pub async fn retry_now(&self) -> Result<(), CoordinatorError> {
        self.supervisor.retry_now().await
    }

    /// Leave the session: stop the watchdog and tear the connection down,
    /// clearing every subscription. The client is inert afterwards.
    pub fn leave(&self) {
        self.supervisor.stop();
        self.connection.disconnect();
    }
}
