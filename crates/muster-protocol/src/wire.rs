//! Literal reply tokens and line formats.
//!
//! Every server reply is a newline-terminated literal line; clients
//! match on the exact bytes, so these must never change shape.

use crate::PlayerName;

/// Sent once when a registration is admitted.
pub const OK_LINE: &str = "OK\n";

/// Sent once when a registration is rejected, before the connection
/// is closed.
pub const REJECT_LINE: &str = "Try next time..\n";

/// Sent periodically while the player's lobby is still filling.
pub const WAIT_LINE: &str = "Please wait...\n";

/// Sent exactly once when the player's lobby reaches capacity.
pub const START_LINE: &str = "START\n";

/// Formats a chat line as broadcast to lobby peers.
pub fn chat_line(sender: &PlayerName, text: &str) -> String {
    format!("{sender} : {text}\n")
}
