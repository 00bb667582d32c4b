//! Wire grammar for Muster.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Resources** ([`ResourceKind`], [`Inventory`]) — the six named
//!   quantities a lobby hands out, and the counters that track them.
//! - **Registration** ([`Registration`], [`PlayerName`]) — the blob a
//!   client sends on connect, and its parsing rules.
//! - **Reply tokens** ([`wire`]) — the literal lines the server sends
//!   back (`OK`, `Try next time..`, `Please wait...`, `START`).
//! - **Errors** ([`ProtocolError`]) — what can go wrong while parsing.
//!
//! The protocol layer sits between transport (raw bytes) and the lobby
//! engine. It doesn't know about connections or lobbies — it only knows
//! how to turn lines of text into validated requests.

mod error;
mod registration;
mod resource;
pub mod wire;

pub use error::ProtocolError;
pub use registration::{PlayerName, Registration, MAX_NAME_LEN};
pub use resource::{Inventory, ResourceKind};
