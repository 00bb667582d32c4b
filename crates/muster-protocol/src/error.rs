//! Error types for the protocol layer.

/// Errors that can occur while parsing client or operator input.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The token is not one of the six recognized resource names.
    #[error("unknown resource {0:?}")]
    UnknownResource(String),

    /// A line did not match `<resource-name>\t<amount>`.
    #[error("malformed line {0:?}")]
    MalformedLine(String),

    /// A requested or configured amount was not a positive integer.
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    /// The registration blob had no name line, or the name was invalid.
    #[error("invalid player name: {0}")]
    InvalidName(String),
}
