//! Error types for the session coordinator.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures are recovered automatically by bounded backoff and only
//! surface once the attempt cap is exhausted (as a persistent `Disconnected`
//! connection state). Decode failures are logged and dropped by the reader.
//! Everything a caller sees here is either a local pre-check rejection, an
//! authoritative refusal, or a hard request/response failure.

use std::fmt;

use wire::Mark;

/// Why a move attempt was rejected locally, before any network call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IllegalMoveReason {
    /// Row or column outside the 3×3 grid.
    OutOfRange,
    /// The session is not in the `Ongoing` status.
    NotOngoing,
    /// The game already has an outcome.
    GameDecided,
    /// It is the other participant's turn (or no mark is assigned yet).
    NotYourTurn,
    /// The target cell already carries a mark.
    CellOccupied,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutOfRange => "coordinates outside the grid",
            Self::NotOngoing => "game is not in progress",
            Self::GameDecided => "game already has an outcome",
            Self::NotYourTurn => "not your turn",
            Self::CellOccupied => "cell already occupied",
        };
        f.write_str(text)
    }
}

/// Session-state invariant violations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// A mark is assigned exactly once per session per participant.
    #[error("local mark already assigned as {current}, refusing {requested}")]
    MarkReassigned { current: Mark, requested: Mark },
    /// The local participant matches neither role of the session.
    #[error("participant {player_id} holds no role in session {session_id}")]
    UnknownParticipant {
        player_id: String,
        session_id: String,
    },
}

/// Top-level error for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The persistent transport failed to open or dropped mid-operation.
    #[error("transport error: {0}")]
    Transport(Box<tokio_tungstenite::tungstenite::Error>),
    /// A push frame could not be decoded.
    #[error(transparent)]
    Codec(#[from] wire::CodecError),
    /// The websocket endpoint could not be derived from the configuration.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    /// The move was rejected locally, without a network round-trip.
    #[error("illegal move: {0}")]
    IllegalMove(IllegalMoveReason),
    /// The authority refused a syntactically valid submission.
    #[error("rejected by server: {message}")]
    Rejected { message: String },
    /// Request/response channel failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// A header value (bearer token) could not be encoded.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
    /// A session-state invariant would have been violated.
    #[error(transparent)]
    State(#[from] StateError),
}

impl From<tokio_tungstenite::tungstenite::Error> for CoordinatorError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(Box::new(error))
    }
}
