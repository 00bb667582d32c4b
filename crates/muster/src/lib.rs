//! Muster server: lobby matchmaking and chat over Unix domain sockets.
//!
//! Players connect, register a name and a resource request, and are
//! seated into the currently filling lobby. A lobby starts the moment
//! its last slot fills; from then on every line a seated player sends
//! is relayed to the rest of its lobby.
//!
//! The binary lives in `main.rs`; this library exposes the assembled
//! [`MusterServer`] plus the operator surface so integration tests can
//! drive a real server in-process.

mod admin;
mod error;
mod handler;
mod server;

pub use admin::{render_status, spawn_operator_tasks};
pub use error::MusterError;
pub use server::{
    MusterServer, ServerConfig, ShutdownHandle, WAIT_NOTICE_PERIOD, load_inventory_file,
};
