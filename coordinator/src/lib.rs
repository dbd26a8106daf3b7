//! Real-time session coordinator for the two-player grid game.
//!
//! The coordinator owns the client-side mirror of shared game state,
//! negotiates room membership over the persistent websocket, gates move
//! attempts on the mirrored turn, and repairs connection or occupancy drift
//! automatically. Build one [`GameClient`] per session; everything else in
//! this crate is wiring underneath it.

pub mod api;
pub mod backoff;
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod room;
pub mod session;
pub mod supervisor;

pub use api::{BoardSnapshot, HttpSessionApi, MoveReply, SessionApi, SessionRecord};
pub use backoff::BackoffPolicy;
pub use client::GameClient;
pub use config::ClientConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{CoordinatorError, IllegalMoveReason, StateError};
pub use session::{AuthoritativeUpdate, SessionState, SessionView, SharedSession};
pub use supervisor::RetrySupervisor;
