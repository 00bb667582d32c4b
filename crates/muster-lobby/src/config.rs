//! Lobby configuration and lifecycle state machine.

use serde::{Deserialize, Serialize};

use muster_protocol::Inventory;

use crate::LobbyError;

/// Hard upper bound on lobby capacity.
pub const MAX_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// LobbyConfig
// ---------------------------------------------------------------------------

/// Server-wide lobby settings, fixed for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Player slots per lobby. A lobby starts the instant it fills.
    pub capacity: usize,

    /// Maximum total resource units one player may request across all
    /// resource kinds.
    pub quota: u64,

    /// Starting quantities copied into every new lobby.
    pub template: Inventory,
}

impl LobbyConfig {
    /// Checks the configuration against the static limits.
    pub fn validate(&self) -> Result<(), LobbyError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(LobbyError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LobbyState
// ---------------------------------------------------------------------------

/// The lifecycle state of a lobby.
///
/// ```text
/// Filling → Started
/// ```
///
/// - **Filling**: accepting admissions; `0 <= active < capacity`.
/// - **Started**: at capacity, broadcast-enabled; accepts no further
///   admissions. There is no transition back — departures after Started
///   shrink the roster but never reopen the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyState {
    Filling,
    Started,
}

impl LobbyState {
    /// Returns `true` if the lobby is accepting new admissions.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Filling)
    }
}

impl std::fmt::Display for LobbyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filling => write!(f, "Filling"),
            Self::Started => write!(f, "Started"),
        }
    }
}
