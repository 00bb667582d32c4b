//! Chat delivery: fanout of one occupant's line to its lobby peers.
//!
//! Two backends with identical external behavior, chosen at deployment:
//!
//! - **Direct** — the sending worker locks the directory, snapshots the
//!   peer handles, and fans out itself.
//! - **Relay** — the worker forwards the line over a channel to a single
//!   coordinator task which performs the same snapshot and fanout. This
//!   models a topology where workers cannot reach sibling connections
//!   and everything funnels through one coordinator.
//!
//! Either way the snapshot is taken under the lock and the sends happen
//! against unbounded per-peer channels, so a slow peer never stalls the
//! sender and a dead peer never aborts delivery to the others.

use tokio::sync::mpsc;

use muster_protocol::wire;
use muster_transport::ConnectionId;

use crate::{LobbyId, SharedDirectory};

/// Which delivery backend a deployment runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Workers fan out to lobby peers themselves.
    #[default]
    Direct,
    /// Workers hand lines to a coordinator task that fans out.
    Relay,
}

struct RelayEnvelope {
    lobby_id: LobbyId,
    sender: ConnectionId,
    text: String,
}

enum Backend {
    Direct(SharedDirectory),
    Relay(mpsc::UnboundedSender<RelayEnvelope>),
}

/// Delivers a chat line from one slot to every other occupied slot of
/// the same lobby.
pub struct BroadcastRouter {
    backend: Backend,
}

impl BroadcastRouter {
    /// Builds a router over `directory` for the given mode. `Relay`
    /// spawns the coordinator task.
    pub fn new(mode: DeliveryMode, directory: SharedDirectory) -> Self {
        let backend = match mode {
            DeliveryMode::Direct => Backend::Direct(directory),
            DeliveryMode::Relay => {
                let (tx, mut rx) = mpsc::unbounded_channel::<RelayEnvelope>();
                tokio::spawn(async move {
                    tracing::debug!("relay coordinator started");
                    while let Some(envelope) = rx.recv().await {
                        fanout(
                            &directory,
                            envelope.lobby_id,
                            envelope.sender,
                            &envelope.text,
                        )
                        .await;
                    }
                    tracing::debug!("relay coordinator stopped");
                });
                Backend::Relay(tx)
            }
        };
        Self { backend }
    }

    /// Formats `"<name> : <text>"` and delivers it to every occupied
    /// slot in the lobby except the sender's own.
    ///
    /// Lines from one sender keep their order on both backends: the
    /// direct path runs on the sender's own task, and the relay channel
    /// is FIFO.
    pub async fn relay_chat(&self, lobby_id: LobbyId, sender: ConnectionId, text: &str) {
        match &self.backend {
            Backend::Direct(directory) => {
                fanout(directory, lobby_id, sender, text).await;
            }
            Backend::Relay(tx) => {
                let envelope = RelayEnvelope {
                    lobby_id,
                    sender,
                    text: text.to_string(),
                };
                if tx.send(envelope).is_err() {
                    tracing::warn!(%lobby_id, "relay coordinator gone, dropping line");
                }
            }
        }
    }
}

/// Snapshots the lobby's peer handles under the lock, then delivers
/// outside it.
async fn fanout(
    directory: &SharedDirectory,
    lobby_id: LobbyId,
    sender: ConnectionId,
    text: &str,
) {
    let (line, peers) = {
        let dir = directory.lock().await;
        let Some(lobby) = dir.lobby(lobby_id) else {
            tracing::warn!(%lobby_id, "broadcast to unknown lobby");
            return;
        };
        // The sender may have been cleared between its read and this
        // fanout; a nameless sender has nothing left to say.
        let Some(name) = lobby.name_of(sender) else {
            tracing::debug!(%sender, %lobby_id, "sender no longer seated");
            return;
        };
        (wire::chat_line(name, text), lobby.peers_except(sender))
    };

    for peer in peers {
        if peer.send(line.clone()).is_err() {
            tracing::debug!(%lobby_id, "peer writer gone, dropping delivery");
        }
    }
}
