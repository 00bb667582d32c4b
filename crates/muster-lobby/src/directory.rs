//! The lobby directory: the owned, ordered collection of all lobbies.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{Lobby, LobbyConfig, LobbyId, LobbySnapshot};

/// The directory behind its lock — the exclusive section shared by
/// admissions, departures, broadcasts, and snapshots.
pub type SharedDirectory = Arc<Mutex<LobbyDirectory>>;

/// The ordered, ever-growing collection of lobbies.
///
/// Exactly one lobby — always the newest — is open for admission; all
/// earlier lobbies are permanently closed to new admissions, though
/// their rosters may still shrink via departures. Lobbies are never
/// removed or recycled before shutdown; a drained lobby stays resident.
pub struct LobbyDirectory {
    config: LobbyConfig,
    lobbies: Vec<Lobby>,
    closed: bool,
}

impl LobbyDirectory {
    /// Creates the directory with its first lobby seeded from the
    /// template.
    pub fn new(config: LobbyConfig) -> Self {
        let first = Lobby::new(LobbyId(1), config.capacity, config.template);
        Self {
            config,
            lobbies: vec![first],
            closed: false,
        }
    }

    /// The server-wide lobby settings.
    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// The lobby currently open for admission.
    pub fn open_lobby(&self) -> &Lobby {
        self.lobbies.last().expect("directory always has a lobby")
    }

    pub(crate) fn open_lobby_mut(&mut self) -> &mut Lobby {
        self.lobbies
            .last_mut()
            .expect("directory always has a lobby")
    }

    /// Looks a lobby up by ID.
    pub fn lobby(&self, id: LobbyId) -> Option<&Lobby> {
        // IDs are 1-based creation order, so the index is id - 1.
        self.lobbies.get(id.0.checked_sub(1)? as usize)
    }

    pub(crate) fn lobby_mut(&mut self, id: LobbyId) -> Option<&mut Lobby> {
        self.lobbies.get_mut(id.0.checked_sub(1)? as usize)
    }

    /// Creates the successor lobby — a fresh copy of the template — and
    /// makes it the open lobby. Called the instant the previous one
    /// fills, before the lock is released.
    pub(crate) fn advance(&mut self) {
        let id = LobbyId(self.lobbies.len() as u64 + 1);
        self.lobbies
            .push(Lobby::new(id, self.config.capacity, self.config.template));
        tracing::info!(lobby_id = %id, "lobby created");
    }

    /// Number of lobbies ever created.
    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    /// Always `false`: the directory holds at least its first lobby.
    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }

    /// Stops all future admissions. There is no reopening.
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Returns `true` once shutdown has begun.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Snapshots every lobby, oldest first.
    pub fn snapshot(&self) -> Vec<LobbySnapshot> {
        self.lobbies.iter().map(Lobby::snapshot).collect()
    }
}
