//! One lobby: a fixed roster of slots, a live inventory, and the
//! `Filling → Started` start signal.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use muster_protocol::{Inventory, PlayerName};
use muster_transport::ConnectionId;

use crate::LobbyState;

/// Channel sender for delivering outbound chat lines to a player's
/// connection. Unbounded: a send never blocks the lobby lock; the
/// per-connection writer task applies its own timeout.
pub type PeerSender = mpsc::UnboundedSender<String>;

/// A unique identifier for a lobby. Sequential, 1-based, assigned in
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(pub u64);

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L-{}", self.0)
    }
}

/// The contents of an occupied slot.
pub struct Occupant {
    /// The connection holding this slot. Unique across the whole
    /// directory at any instant.
    pub conn: ConnectionId,
    /// The player's registered name.
    pub name: PlayerName,
    /// Outbound channel to this player's writer task.
    pub peer: PeerSender,
}

/// A read-only snapshot of one lobby, taken under the directory lock.
#[derive(Debug, Clone, Serialize)]
pub struct LobbySnapshot {
    /// The lobby's unique ID.
    pub id: LobbyId,
    /// Current lifecycle state.
    pub state: LobbyState,
    /// Names of the occupied slots, in slot order.
    pub players: Vec<String>,
    /// The live inventory counters.
    pub inventory: Inventory,
}

/// One matchmaking/chat unit.
///
/// Created with a fresh copy of the template inventory; mutated only
/// under the directory lock; never destroyed or recycled before
/// shutdown. Departed capacity and deducted resources are never
/// reclaimed.
pub struct Lobby {
    id: LobbyId,
    inventory: Inventory,
    slots: Vec<Option<Occupant>>,
    active: usize,
    state: LobbyState,
    started_tx: watch::Sender<bool>,
}

impl Lobby {
    pub(crate) fn new(id: LobbyId, capacity: usize, template: Inventory) -> Self {
        let (started_tx, _) = watch::channel(false);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            id,
            inventory: template,
            slots,
            active: 0,
            state: LobbyState::Filling,
            started_tx,
        }
    }

    /// The lobby's unique ID.
    pub fn id(&self) -> LobbyId {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LobbyState {
        self.state
    }

    /// Number of occupied slots.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The live inventory counters.
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Returns `true` once every slot has been filled.
    pub fn is_full(&self) -> bool {
        self.active == self.slots.len()
    }

    /// Deducts `request` from the live inventory and seats `occupant`
    /// in the first empty slot, as one atomic step.
    ///
    /// Returns `false` — with nothing changed — if the lobby is not
    /// accepting admissions or the inventory cannot fully cover the
    /// request.
    pub(crate) fn try_admit(&mut self, request: &Inventory, occupant: Occupant) -> bool {
        if !self.state.is_open() || self.is_full() {
            return false;
        }
        if !self.inventory.deduct(request) {
            return false;
        }
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.is_none())
            .expect("non-full lobby has an empty slot");
        *slot = Some(occupant);
        self.active += 1;
        true
    }

    /// Flips `Filling → Started` and wakes every waiting occupant.
    pub(crate) fn mark_started(&mut self) {
        self.state = LobbyState::Started;
        self.started_tx.send_replace(true);
    }

    /// A receiver that resolves when the lobby starts.
    pub fn subscribe_start(&self) -> watch::Receiver<bool> {
        self.started_tx.subscribe()
    }

    /// Clears the slot held by `conn` and decrements the active count.
    ///
    /// Idempotent: clearing an already-empty slot is a no-op reported
    /// as `None`. Never refunds inventory and never reopens a started
    /// lobby. Returns the remaining active count on an actual clear.
    pub(crate) fn clear_slot(&mut self, conn: ConnectionId) -> Option<usize> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|o| o.conn == conn))?;
        *slot = None;
        self.active -= 1;
        Some(self.active)
    }

    /// The registered name of the occupant holding `conn`, if any.
    pub fn name_of(&self, conn: ConnectionId) -> Option<&PlayerName> {
        self.slots
            .iter()
            .flatten()
            .find(|o| o.conn == conn)
            .map(|o| &o.name)
    }

    /// Stable handles to every occupied slot except `sender`, for
    /// broadcast fanout outside the lock.
    pub fn peers_except(&self, sender: ConnectionId) -> Vec<PeerSender> {
        self.slots
            .iter()
            .flatten()
            .filter(|o| o.conn != sender)
            .map(|o| o.peer.clone())
            .collect()
    }

    /// A read-only copy of the lobby's visible state.
    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            id: self.id,
            state: self.state,
            players: self
                .slots
                .iter()
                .flatten()
                .map(|o| o.name.as_str().to_string())
                .collect(),
            inventory: self.inventory,
        }
    }
}
