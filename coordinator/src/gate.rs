//! Optimistic move gating and authoritative submission.
//!
//! The gate is the only component that writes game state from the
//! request/response channel; pushed `move_made` events write the same
//! fields through the connection subscribers. Both paths go through
//! [`SessionState::apply_authoritative`], so every write is a wholesale
//! replacement and never a merge.

use std::sync::Arc;

use wire::{GameStatus, Position};

use crate::api::SessionApi;
use crate::error::{CoordinatorError, IllegalMoveReason};
use crate::session::{AuthoritativeUpdate, SessionState, SessionView, SharedSession};

/// Turn/occupancy validation plus move submission.
#[derive(Clone)]
pub struct MoveGate {
    session: SharedSession,
    api: Arc<dyn SessionApi>,
}

impl MoveGate {
    #[must_use]
    pub fn new(session: SharedSession, api: Arc<dyn SessionApi>) -> Self {
        Self { session, api }
    }

    /// Attempt a move at `(row, col)`.
    ///
    /// Obviously illegal attempts (out-of-range coordinates, wrong status,
    /// decided game, wrong turn, occupied cell) fail fast with
    /// [`CoordinatorError::IllegalMove`] and never reach the network.
    /// Otherwise the position goes to the authority; an accepted move's
    /// reply replaces board, outcome, status and turn wholesale, and a
    /// rejected one leaves local state exactly as it was.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::IllegalMove`] for local rejections,
    /// [`CoordinatorError::Rejected`] for authoritative refusals, and
    /// [`CoordinatorError::Http`] when the channel itself fails.
    pub async fn attempt_move(&self, row: u8, col: u8) -> Result<SessionView, CoordinatorError> {
        let position = Position::new(row, col)
            .map_err(|_| CoordinatorError::IllegalMove(IllegalMoveReason::OutOfRange))?;

        let (session_id, player_id) = {
            let session = self.session.lock();
            Self::check_local(&session, position)?;
            (session.id().to_owned(), session.local_player().to_owned())
        };

        let reply = self
            .api
            .submit_move(&session_id, &player_id, position)
            .await?;

        let mut session = self.session.lock();
        session.apply_authoritative(AuthoritativeUpdate {
            board: reply.board,
            outcome: reply.winner,
            status: reply.game_status,
            next_turn: reply.next_turn,
        });
        Ok(session.view())
    }

    fn check_local(session: &SessionState, position: Position) -> Result<(), CoordinatorError> {
        let reason = if session.status() != GameStatus::Ongoing {
            Some(IllegalMoveReason::NotOngoing)
        } else if session.outcome().is_some() {
            Some(IllegalMoveReason::GameDecided)
        } else if !session.is_local_turn() {
            Some(IllegalMoveReason::NotYourTurn)
        } else if session.board().cell(position).is_some() {
            Some(IllegalMoveReason::CellOccupied)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(CoordinatorError::IllegalMove(reason)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
