//! Unified error type for the Muster server.

use muster_lobby::LobbyError;
use muster_protocol::ProtocolError;
use muster_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum MusterError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (malformed inventory file).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A lobby-configuration error.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// An I/O error outside the transport (reading configuration).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
