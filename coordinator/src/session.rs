//! Canonical in-memory mirror of the shared game state.
//!
//! ARCHITECTURE
//! ============
//! The coordinator exclusively owns one [`SessionState`] behind a mutex;
//! every other component mutates it through setters that enforce the session
//! invariants, and front-ends only ever see cloned [`SessionView`] snapshots.
//! The board is never written cell-by-cell here; authoritative snapshots
//! replace it wholesale.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use wire::{Board, GameOutcome, GameStatus, Mark};

use crate::error::StateError;

/// Maximum number of participants in a room.
pub const MAX_OCCUPANCY: u8 = 2;

/// Shared handle to the session mirror.
pub type SharedSession = Arc<Mutex<SessionState>>;

/// Mutable session mirror. See the module docs for the ownership rules.
#[derive(Debug)]
pub struct SessionState {
    id: String,
    status: GameStatus,
    board: Board,
    player_x: Option<String>,
    player_o: Option<String>,
    local_player: String,
    local_mark: Option<Mark>,
    turn: Mark,
    outcome: Option<GameOutcome>,
    occupancy: u8,
    revision: u64,
}

/// Wholesale state replacement delivered by an authoritative source: either
/// the reply to our own move submission, or a `move_made` push for the other
/// participant's move.
#[derive(Clone, Copy, Debug)]
pub struct AuthoritativeUpdate {
    pub board: Board,
    pub outcome: Option<GameOutcome>,
    pub status: GameStatus,
    pub next_turn: Mark,
}

/// Read-only snapshot handed to front-ends.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub id: String,
    pub status: GameStatus,
    pub board: Board,
    pub local_mark: Option<Mark>,
    pub turn: Mark,
    pub local_turn: bool,
    pub outcome: Option<GameOutcome>,
    pub occupancy: u8,
    pub revision: u64,
}

impl SessionState {
    /// Fresh mirror for the given session identity. Starts `Waiting`, with an
    /// empty board, `X` to move, and nobody in the room.
    #[must_use]
    pub fn new(id: impl Into<String>, local_player: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: GameStatus::Waiting,
            board: Board::empty(),
            player_x: None,
            player_o: None,
            local_player: local_player.into(),
            local_mark: None,
            turn: Mark::X,
            outcome: None,
            occupancy: 0,
            revision: 0,
        }
    }

    /// Wrap into the shared handle the coordinator components hold.
    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn board(&self) -> Board {
        self.board
    }

    #[must_use]
    pub fn local_player(&self) -> &str {
        &self.local_player
    }

    #[must_use]
    pub fn local_mark(&self) -> Option<Mark> {
        self.local_mark
    }

    #[must_use]
    pub fn turn(&self) -> Mark {
        self.turn
    }

    #[must_use]
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn occupancy(&self) -> u8 {
        self.occupancy
    }

    /// Monotonic change counter; bumped by every mutation so front-ends can
    /// observe change cheaply.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the turn belongs to the local participant.
    #[must_use]
    pub fn is_local_turn(&self) -> bool {
        self.local_mark == Some(self.turn)
    }

    /// Whether a move attempt may even be submitted: the game is running,
    /// undecided, and it is the local participant's turn.
    #[must_use]
    pub fn can_submit_move(&self) -> bool {
        self.status == GameStatus::Ongoing && self.outcome.is_none() && self.is_local_turn()
    }

    /// Record the role assignment reported by the authority.
    pub fn set_players(&mut self, player_x: Option<String>, player_o: Option<String>) {
        self.player_x = player_x;
        self.player_o = player_o;
        self.revision += 1;
    }

    /// Assign the local mark. Set-once: assigning the same mark again is a
    /// no-op, a different mark is an invariant violation.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MarkReassigned`] when a different mark was
    /// already assigned.
    pub fn assign_mark(&mut self, mark: Mark) -> Result<(), StateError> {
        match self.local_mark {
            None => {
                self.local_mark = Some(mark);
                self.revision += 1;
                Ok(())
            }
            Some(current) if current == mark => Ok(()),
            Some(current) => Err(StateError::MarkReassigned {
                current,
                requested: mark,
            }),
        }
    }

    /// Derive the local mark from the role assignment (fresh load of an
    /// existing session, where the mark was not handed out at create/join).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnknownParticipant`] when the local participant
    /// matches neither role.
    pub fn derive_local_mark(&mut self) -> Result<Mark, StateError> {
        if let Some(mark) = self.local_mark {
            return Ok(mark);
        }
        let mark = if self.player_x.as_deref() == Some(self.local_player.as_str()) {
            Mark::X
        } else if self.player_o.as_deref() == Some(self.local_player.as_str()) {
            Mark::O
        } else {
            return Err(StateError::UnknownParticipant {
                player_id: self.local_player.clone(),
                session_id: self.id.clone(),
            });
        };
        self.local_mark = Some(mark);
        self.revision += 1;
        Ok(mark)
    }

    /// Adopt the status reported when loading an existing session. Not a
    /// gameplay transition; see [`Self::begin_game`] for that.
    pub fn restore_status(&mut self, status: GameStatus) {
        if self.status != status {
            self.status = status;
            self.revision += 1;
        }
    }

    /// Record the room occupancy reported over the persistent channel.
    /// Values outside `0..=2` are clamped with a warning.
    pub fn set_occupancy(&mut self, players: u32) {
        let clamped = if players > u32::from(MAX_OCCUPANCY) {
            warn!(players, "occupancy above room capacity, clamping");
            MAX_OCCUPANCY
        } else {
            #[allow(clippy::cast_possible_truncation)]
            {
                players as u8
            }
        };
        if self.occupancy != clamped {
            self.occupancy = clamped;
            self.revision += 1;
        }
    }

    /// `Waiting` → `Ongoing` transition on the start event. Ignored once the
    /// session left `Waiting` (`Finished` is terminal, and a duplicate start
    /// for an ongoing game carries no information).
    pub fn begin_game(&mut self, status: GameStatus) {
        if self.status != GameStatus::Waiting {
            debug!(current = ?self.status, "ignoring start event outside Waiting");
            return;
        }
        if status == GameStatus::Ongoing {
            self.status = GameStatus::Ongoing;
            self.revision += 1;
        }
    }

    /// Replace board, outcome, status and turn wholesale from an
    /// authoritative source. Never merges. Ignored once `Finished`.
    pub fn apply_authoritative(&mut self, update: AuthoritativeUpdate) {
        if self.status == GameStatus::Finished {
            debug!("ignoring authoritative update after finish");
            return;
        }
        self.board = update.board;
        self.outcome = update.outcome;
        self.turn = update.next_turn;
        self.status = if update.outcome.is_some() && update.status != GameStatus::Finished {
            warn!(status = ?update.status, "outcome present, forcing Finished");
            GameStatus::Finished
        } else {
            update.status
        };
        self.revision += 1;
    }

    /// Apply a board snapshot fetched out of band (reconnect refresh). The
    /// snapshot carries no turn or status, so both are derived: `X` moves
    /// first, so equal mark counts mean `X` is to move.
    pub fn refresh_board(&mut self, board: Board, winner: Option<GameOutcome>) {
        if self.status == GameStatus::Finished {
            debug!("ignoring board refresh after finish");
            return;
        }
        let next_turn = if board.count(Mark::X) == board.count(Mark::O) {
            Mark::X
        } else {
            Mark::O
        };
        let status = if winner.is_some() {
            GameStatus::Finished
        } else {
            self.status
        };
        self.apply_authoritative(AuthoritativeUpdate {
            board,
            outcome: winner,
            status,
            next_turn,
        });
    }

    /// Cloned snapshot for read-only consumers.
    #[must_use]
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id.clone(),
            status: self.status,
            board: self.board,
            local_mark: self.local_mark,
            turn: self.turn,
            local_turn: self.is_local_turn(),
            outcome: self.outcome,
            occupancy: self.occupancy,
            revision: self.revision,
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
