//! Lobby engine for Muster.
//!
//! Lobbies fill with admitted players, flip to started at capacity, and
//! then carry chat between their occupants. All lobby state lives in one
//! [`LobbyDirectory`] behind a single lock — the exclusive section that
//! makes admissions, departures, and snapshots linearizable.
//!
//! # Key types
//!
//! - [`AdmissionEngine`] — validates and atomically reserves a resource
//!   request against the currently open lobby
//! - [`LobbyDirectory`] — the append-only, never-recycled lobby list
//! - [`BroadcastRouter`] — delivers chat to lobby peers, via direct
//!   fanout or a relay coordinator task ([`DeliveryMode`])
//! - [`LobbyState`] — the `Filling → Started` lifecycle

mod admission;
mod config;
mod delivery;
mod directory;
mod error;
mod lobby;

pub use admission::{AdmissionEngine, Decision, RejectReason, Ticket};
pub use config::{LobbyConfig, LobbyState, MAX_CAPACITY};
pub use delivery::{BroadcastRouter, DeliveryMode};
pub use directory::{LobbyDirectory, SharedDirectory};
pub use error::LobbyError;
pub use lobby::{Lobby, LobbyId, LobbySnapshot, Occupant, PeerSender};
