//! Room membership negotiation on top of the persistent connection.
//!
//! Membership is connection-scoped, not participant-scoped: a fresh socket
//! has no implicit membership, so the coordinator issues its room command
//! again after every successful open, reconnects included. The command is
//! chosen by the local mark (the creator `X` creates the room, the second
//! participant `O` joins it), and re-sending it is harmless on the
//! authority side.

use tracing::warn;
use wire::{ClientCommand, Mark};

use crate::connection::ConnectionManager;
use crate::session::SharedSession;

/// Decides and issues the create-vs-join room command.
#[derive(Clone)]
pub struct RoomCoordinator {
    session: SharedSession,
}

impl RoomCoordinator {
    #[must_use]
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// Issue the role-appropriate room command for the current session.
    ///
    /// An unknown local mark (fresh load of an existing session) is derived
    /// from the role assignment first; if no role matches, the command is
    /// skipped with a warning; there is nothing sensible to send.
    pub fn issue(&self, connection: &ConnectionManager) {
        let command = {
            let mut session = self.session.lock();
            let mark = match session.derive_local_mark() {
                Ok(mark) => mark,
                Err(error) => {
                    warn!(%error, "cannot issue a room command without a role");
                    return;
                }
            };
            let room_id = session.id().to_owned();
            match mark {
                Mark::X => ClientCommand::CreateRoom { room_id },
                Mark::O => ClientCommand::JoinRoom { room_id },
            }
        };
        connection.send(&command);
    }
}
