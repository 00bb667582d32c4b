//! The admission engine: the single serialization point for all lobby
//! state mutation.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use muster_protocol::{PlayerName, Registration};
use muster_transport::ConnectionId;

use crate::{
    LobbyConfig, LobbyDirectory, LobbyId, LobbySnapshot, Occupant, PeerSender,
    SharedDirectory,
};

/// Why a registration was turned away. Internal detail for logs; the
/// wire always carries the literal rejection line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The blob failed the registration grammar.
    #[error("malformed request")]
    Malformed,

    /// The request exceeded the per-player quota or the lobby's
    /// remaining stock.
    #[error("insufficient resources or quota exceeded")]
    Insufficient,

    /// Shutdown has begun; no lobby will be mutated.
    #[error("server closing")]
    ServerClosing,
}

/// Proof of admission, returned to the worker that owns the connection.
pub struct Ticket {
    /// The lobby the player was seated in.
    pub lobby_id: LobbyId,
    /// The validated player name.
    pub name: PlayerName,
    /// Resolves to `true` the instant the lobby starts.
    pub started: watch::Receiver<bool>,
}

/// The outcome of one admission attempt.
pub enum Decision {
    /// The request was reserved and the player seated.
    Admitted(Ticket),
    /// Nothing was touched; the caller sends the rejection line and
    /// closes.
    Rejected(RejectReason),
}

/// Validates and atomically applies registration requests against the
/// directory's currently open lobby.
///
/// Every mutation — admission, departure, shutdown — happens inside the
/// directory lock, with no I/O held across it, so all concurrent calls
/// serialize into one history: granted resources never exceed a lobby's
/// template, and a lobby never seats more than `capacity` players.
#[derive(Clone)]
pub struct AdmissionEngine {
    directory: SharedDirectory,
}

impl AdmissionEngine {
    /// Creates the engine and its directory, seeded with the first
    /// lobby.
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            directory: Arc::new(Mutex::new(LobbyDirectory::new(config))),
        }
    }

    /// The shared directory, for wiring up a [`BroadcastRouter`].
    ///
    /// [`BroadcastRouter`]: crate::BroadcastRouter
    pub fn directory(&self) -> SharedDirectory {
        Arc::clone(&self.directory)
    }

    /// Parses `blob` and, if valid, reserves the requested resources
    /// and a slot in the open lobby.
    ///
    /// Parsing happens outside the lock; rejected registrations touch
    /// no state. When the admission fills the lobby, the successor is
    /// created before the lock is released, so the very next
    /// registration always targets a lobby with free capacity.
    pub async fn admit(
        &self,
        blob: &str,
        conn: ConnectionId,
        peer: PeerSender,
    ) -> Decision {
        let reg = match Registration::parse(blob) {
            Ok(reg) => reg,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "malformed registration");
                return Decision::Rejected(RejectReason::Malformed);
            }
        };

        let mut dir = self.directory.lock().await;
        if dir.is_closed() {
            return Decision::Rejected(RejectReason::ServerClosing);
        }
        if reg.total > dir.config().quota {
            tracing::info!(
                %conn,
                player = %reg.name,
                total = reg.total,
                "rejected: quota exceeded"
            );
            return Decision::Rejected(RejectReason::Insufficient);
        }

        let lobby = dir.open_lobby_mut();
        let lobby_id = lobby.id();
        let occupant = Occupant {
            conn,
            name: reg.name.clone(),
            peer,
        };
        if !lobby.try_admit(&reg.request, occupant) {
            tracing::info!(
                %conn,
                player = %reg.name,
                %lobby_id,
                "rejected: insufficient inventory"
            );
            return Decision::Rejected(RejectReason::Insufficient);
        }

        let started = lobby.subscribe_start();
        tracing::info!(
            %conn,
            player = %reg.name,
            %lobby_id,
            active = lobby.active(),
            "player admitted"
        );

        if lobby.is_full() {
            lobby.mark_started();
            tracing::info!(%lobby_id, "lobby started");
            dir.advance();
        }

        Decision::Admitted(Ticket {
            lobby_id,
            name: reg.name,
            started,
        })
    }

    /// Clears the slot held by `conn` in `lobby_id`.
    ///
    /// Idempotent: a second call for an already-empty slot is a no-op
    /// returning `None`. Never refunds inventory or reopens the lobby.
    /// Returns the lobby's remaining active count on an actual clear.
    pub async fn leave(&self, lobby_id: LobbyId, conn: ConnectionId) -> Option<usize> {
        let mut dir = self.directory.lock().await;
        let remaining = dir.lobby_mut(lobby_id)?.clear_slot(conn)?;
        tracing::info!(%conn, %lobby_id, remaining, "player left");
        Some(remaining)
    }

    /// A consistent snapshot of every lobby, taken under the same lock
    /// as admissions so it never observes a half-applied one.
    pub async fn snapshot(&self) -> Vec<LobbySnapshot> {
        self.directory.lock().await.snapshot()
    }

    /// Begins shutdown: every admission from now on is rejected with
    /// [`RejectReason::ServerClosing`]. In-flight admissions either
    /// completed before this took the lock or observe the closed flag —
    /// never a partial mutation.
    pub async fn close(&self) {
        let mut dir = self.directory.lock().await;
        dir.close();
        tracing::info!(lobbies = dir.len(), "admissions closed");
    }
}
