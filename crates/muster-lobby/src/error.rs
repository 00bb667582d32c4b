//! Error types for the lobby layer.

/// Errors that can occur while configuring the lobby engine.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The configured capacity is zero or exceeds [`MAX_CAPACITY`].
    ///
    /// [`MAX_CAPACITY`]: crate::MAX_CAPACITY
    #[error("lobby capacity {0} out of range (1..={max})", max = crate::MAX_CAPACITY)]
    InvalidCapacity(usize),
}
