//! Registration blob parsing.
//!
//! A client's first message is a single blob: the player's name on the
//! first line, followed by zero or more `<resource-name>\t<amount>`
//! lines. The whole blob stands or falls together — one bad line and the
//! registration is invalid, with no state touched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Inventory, ProtocolError, ResourceKind};

/// Maximum length of a player name, in bytes.
pub const MAX_NAME_LEN: usize = 15;

/// A validated player name: a non-empty single token of at most
/// [`MAX_NAME_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Validates and wraps a raw name token.
    pub fn new(raw: &str) -> Result<Self, ProtocolError> {
        if raw.is_empty() {
            return Err(ProtocolError::InvalidName("empty name".to_string()));
        }
        if raw.len() > MAX_NAME_LEN {
            return Err(ProtocolError::InvalidName(format!(
                "name {raw:?} exceeds {MAX_NAME_LEN} bytes"
            )));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(ProtocolError::InvalidName(format!(
                "name {raw:?} contains whitespace"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed, validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The requested player name.
    pub name: PlayerName,
    /// Requested amounts, with duplicate resource lines summed.
    pub request: Inventory,
    /// Sum of all requested amounts (checked against the quota).
    pub total: u64,
}

impl Registration {
    /// Parses a registration blob.
    ///
    /// Grammar: first line is the player name; every following non-empty
    /// line is `<resource-name>\t<amount>` with a positive amount.
    /// Duplicate resource lines sum. Any malformed line, unknown
    /// resource, or non-positive amount invalidates the whole blob.
    pub fn parse(blob: &str) -> Result<Self, ProtocolError> {
        let mut lines = blob.lines().map(|l| l.trim_end_matches('\r'));

        let name_line = lines
            .next()
            .ok_or_else(|| ProtocolError::InvalidName("missing name line".to_string()))?;
        let name = PlayerName::new(name_line.trim())?;

        let mut request = Inventory::empty();
        let mut total: u64 = 0;
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let (res, amount) = match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(res), Some(amount), None) => (res, amount),
                _ => return Err(ProtocolError::MalformedLine(line.to_string())),
            };
            let kind = ResourceKind::from_name(res)
                .ok_or_else(|| ProtocolError::UnknownResource(res.to_string()))?;
            let amount: i64 = amount
                .parse()
                .map_err(|_| ProtocolError::InvalidAmount(amount.to_string()))?;
            if amount <= 0 {
                return Err(ProtocolError::InvalidAmount(amount.to_string()));
            }
            request.add(kind, amount as u64);
            total = total.saturating_add(amount as u64);
        }

        Ok(Self { name, request, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let reg = Registration::parse("alice\n").unwrap();
        assert_eq!(reg.name.as_str(), "alice");
        assert_eq!(reg.total, 0);
    }

    #[test]
    fn test_parse_full_request() {
        let reg = Registration::parse("alice\ngold\t3\narmor\t2\n").unwrap();
        assert_eq!(reg.request.get(ResourceKind::Gold), 3);
        assert_eq!(reg.request.get(ResourceKind::Armor), 2);
        assert_eq!(reg.total, 5);
    }

    #[test]
    fn test_parse_duplicate_lines_sum() {
        let reg = Registration::parse("bob\ngold\t2\ngold\t3\n").unwrap();
        assert_eq!(reg.request.get(ResourceKind::Gold), 5);
        assert_eq!(reg.total, 5);
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert!(Registration::parse("").is_err());
        assert!(Registration::parse("\ngold\t1\n").is_err());
    }

    #[test]
    fn test_parse_rejects_overlong_name() {
        let reg = Registration::parse("a_very_long_name_indeed\n");
        assert!(matches!(reg, Err(ProtocolError::InvalidName(_))));
        // Exactly 15 bytes is fine.
        assert!(Registration::parse("exactly15bytes_\n").is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_resource() {
        let reg = Registration::parse("alice\nmithril\t2\n");
        assert!(matches!(reg, Err(ProtocolError::UnknownResource(_))));
    }

    #[test]
    fn test_parse_rejects_non_positive_amount() {
        assert!(Registration::parse("alice\ngold\t0\n").is_err());
        assert!(Registration::parse("alice\ngold\t-3\n").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        assert!(Registration::parse("alice\ngold\n").is_err());
        assert!(Registration::parse("alice\ngold\t1\textra\n").is_err());
    }

    #[test]
    fn test_player_name_rejects_whitespace() {
        assert!(PlayerName::new("two words").is_err());
    }
}
