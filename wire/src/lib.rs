//! Shared wire model for the realtime game protocol.
//!
//! This crate owns the message types exchanged over the persistent WebSocket
//! channel plus the small game model (marks, board, positions, outcomes) that
//! the coordinator and its front-ends share. Messages travel as JSON text
//! frames tagged by a `type` field; [`encode_command`] and [`decode_event`]
//! are the only codec entry points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side length of the grid.
pub const BOARD_SIZE: usize = 3;

/// Error returned by [`decode_event`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text frame is not valid JSON, or its `type` tag and fields do not
    /// match any known server event.
    #[error("failed to decode server event: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Error returned when constructing or parsing a [`Position`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// One or both coordinates fall outside the 3×3 grid.
    #[error("coordinate out of range: {0},{1}")]
    OutOfRange(u8, u8),
    /// The text form is not `row,col`.
    #[error("malformed position `{0}`, expected `row,col`")]
    Malformed(String),
}

/// A participant's mark on the grid.
///
/// `X` belongs to the session creator and always moves first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The opposing mark.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// Lifecycle status of a game session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Created, waiting for the second participant.
    #[default]
    Waiting,
    /// Both participants present; moves are being played.
    Ongoing,
    /// Terminal. A new session is required to play again.
    Finished,
}

/// How a finished game ended. Absent (`None` at the call sites) while the
/// game is still running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    /// The given mark completed a line.
    Winner(Mark),
    /// The grid filled with no line completed.
    Draw,
}

impl Serialize for GameOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Winner(mark) => mark.serialize(serializer),
            Self::Draw => serializer.serialize_str("draw"),
        }
    }
}

impl<'de> Deserialize<'de> for GameOutcome {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "X" => Ok(Self::Winner(Mark::X)),
            "O" => Ok(Self::Winner(Mark::O)),
            "draw" => Ok(Self::Draw),
            other => Err(serde::de::Error::unknown_variant(other, &["X", "O", "draw"])),
        }
    }
}

/// A grid coordinate. Canonical text form is `"row,col"`, which is also how
/// positions appear on both network channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    /// Build a position after bounds-checking both coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::OutOfRange`] when either coordinate is
    /// outside `0..3`.
    pub fn new(row: u8, col: u8) -> Result<Self, PositionError> {
        #[allow(clippy::cast_possible_truncation)]
        let size = BOARD_SIZE as u8;
        if row >= size || col >= size {
            return Err(PositionError::OutOfRange(row, col));
        }
        Ok(Self { row, col })
    }

    /// Zero-based row index.
    #[must_use]
    pub fn row(self) -> u8 {
        self.row
    }

    /// Zero-based column index.
    #[must_use]
    pub fn col(self) -> u8 {
        self.col
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PositionError::Malformed(s.to_owned());
        let (row, col) = s.split_once(',').ok_or_else(malformed)?;
        let row = row.trim().parse::<u8>().map_err(|_| malformed())?;
        let col = col.trim().parse::<u8>().map_err(|_| malformed())?;
        Self::new(row, col)
    }
}

impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The 3×3 grid. Cells hold `None` while empty.
///
/// JSON form is a 3×3 array of `null` / `"X"` / `"O"`. The board is only
/// ever replaced wholesale by an authoritative snapshot; there is no
/// cell-level mutation on the consuming side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([[Option<Mark>; BOARD_SIZE]; BOARD_SIZE]);

impl Board {
    /// A board with every cell empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a board from explicit rows.
    #[must_use]
    pub fn from_rows(rows: [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self(rows)
    }

    /// The mark at `position`, if any.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<Mark> {
        self.0[position.row() as usize][position.col() as usize]
    }

    /// Copy of this board with `mark` placed at `position`.
    ///
    /// Construction helper for authoritative sources (servers, test stubs);
    /// the coordinator itself never places marks locally.
    #[must_use]
    pub fn with_mark(mut self, position: Position, mark: Mark) -> Self {
        self.0[position.row() as usize][position.col() as usize] = Some(mark);
        self
    }

    /// Number of cells carrying the given mark.
    #[must_use]
    pub fn count(&self, mark: Mark) -> usize {
        self.0
            .iter()
            .flatten()
            .filter(|cell| **cell == Some(mark))
            .count()
    }

    /// Row-major view of the cells, for rendering.
    #[must_use]
    pub fn rows(&self) -> &[[Option<Mark>; BOARD_SIZE]; BOARD_SIZE] {
        &self.0
    }
}

/// Commands the client sends over the persistent channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Open a room for the session. Issued by the participant playing `X`.
    CreateRoom { room_id: String },
    /// Enter an existing room. Issued by the participant playing `O`.
    JoinRoom { room_id: String },
}

/// Events the server pushes over the persistent channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The room now exists; `players` is its current occupancy.
    RoomCreated { room_id: String, players: u32 },
    /// This connection entered the room.
    RoomJoined { room_id: String, players: u32 },
    /// Another participant entered the room.
    PlayerJoined { room_id: String, players: u32 },
    /// Both participants are present and play has begun.
    GameStarted { game_id: String, status: GameStatus },
    /// A move was accepted by the authority and broadcast to the room.
    MoveMade {
        game_id: String,
        player_id: String,
        position: Position,
        symbol: Mark,
        board: Board,
        #[serde(default)]
        winner: Option<GameOutcome>,
        game_status: GameStatus,
    },
}

impl ServerEvent {
    /// The dispatch-table key for this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RoomCreated { .. } => EventKind::RoomCreated,
            Self::RoomJoined { .. } => EventKind::RoomJoined,
            Self::PlayerJoined { .. } => EventKind::PlayerJoined,
            Self::GameStarted { .. } => EventKind::GameStarted,
            Self::MoveMade { .. } => EventKind::MoveMade,
        }
    }

    /// Room occupancy carried by this event, for the events that report it.
    #[must_use]
    pub fn players(&self) -> Option<u32> {
        match self {
            Self::RoomCreated { players, .. }
            | Self::RoomJoined { players, .. }
            | Self::PlayerJoined { players, .. } => Some(*players),
            Self::GameStarted { .. } | Self::MoveMade { .. } => None,
        }
    }
}

/// Subscription key: one variant per [`ServerEvent`] tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    RoomCreated,
    RoomJoined,
    PlayerJoined,
    GameStarted,
    MoveMade,
}

/// Encode a command as a JSON text frame.
#[must_use]
pub fn encode_command(command: &ClientCommand) -> String {
    // A tagged enum of plain strings cannot fail to serialize.
    serde_json::to_string(command).unwrap_or_default()
}

/// Decode a JSON text frame into a server event.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed JSON or unknown tags. The
/// caller is expected to log and drop such frames, not to tear the
/// connection down.
pub fn decode_event(text: &str) -> Result<ServerEvent, CodecError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
