//! Level-triggered watchdog that repairs connection and occupancy drift.
//!
//! The supervisor must be running whenever the connection is down or the
//! room is short-handed, and stopped otherwise. That condition is
//! re-evaluated through [`RetrySupervisor::ensure`] after every relevant
//! state change; the periodic task itself re-checks it after each tick and
//! settles once both a live connection and a full room hold.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::CoordinatorError;
use crate::room::RoomCoordinator;
use crate::session::{MAX_OCCUPANCY, SharedSession};

/// Periodic repair task; singleton per session.
#[derive(Clone)]
pub struct RetrySupervisor {
    inner: Arc<SupervisorInner>,
}

struct SupervisorInner {
    interval: Duration,
    session: SharedSession,
    connection: ConnectionManager,
    room: RoomCoordinator,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RetrySupervisor {
    #[must_use]
    pub fn new(
        interval: Duration,
        session: SharedSession,
        connection: ConnectionManager,
        room: RoomCoordinator,
    ) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                interval,
                session,
                connection,
                room,
                task: Mutex::new(None),
            }),
        }
    }

    /// Whether the periodic task is currently running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner
            .task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start the periodic task. No-op while one is already running.
    pub fn start(&self) {
        let mut guard = self.inner.task.lock();
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let supervisor = self.clone();
        *guard = Some(tokio::spawn(async move { supervisor.run().await }));
    }

    /// Abort the periodic task if running.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.task.lock().take() {
            handle.abort();
        }
    }

    /// Re-evaluate the run condition (active iff the connection is down or
    /// the room is short-handed) and start or stop accordingly.
    pub fn ensure(&self) {
        if self.should_run() {
            self.start();
        } else {
            self.stop();
        }
    }

    /// User-triggered recovery: one connect + room-command sequence outside
    /// the periodic timer. `connect()` releases any existing socket before
    /// dialing, so no duplicate transport can result, and the room command
    /// is issued by the open observer.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the dial fails; the periodic task is
    /// (re)ensured either way.
    pub async fn retry_now(&self) -> Result<(), CoordinatorError> {
        let outcome = self.inner.connection.connect().await;
        self.ensure();
        outcome
    }

    fn should_run(&self) -> bool {
        let connected = self.inner.connection.state() == ConnectionState::Connected;
        let occupancy = self.inner.session.lock().occupancy();
        !connected || occupancy < MAX_OCCUPANCY
    }

    async fn run(&self) {
        loop {
            tokio::time::sleep(self.inner.interval).await;
            self.tick().await;
            if !self.should_run() {
                // settled: connection up and room full; the stored handle
                // now reports finished, so start() and is_active() move on
                debug!("supervisor settled");
                return;
            }
        }
    }

    async fn tick(&self) {
        if self.inner.connection.state() == ConnectionState::Connected {
            // idempotent re-issue while the room stays short-handed
            self.inner.room.issue(&self.inner.connection);
        } else if let Err(error) = self.inner.connection.connect().await {
            debug!(%error, "supervised reconnect failed, retrying next tick");
        }
    }
}

#[cfg(test)]
#[path = "supervisor_test.rs"]
mod tests;
