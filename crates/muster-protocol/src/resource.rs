//! The six lobby resources and the counters that track them.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// One of the six resource kinds a lobby stocks.
///
/// The set is closed: any other token fails name lookup. The discriminant
/// doubles as the index into an [`Inventory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Gold,
    Armor,
    Ammo,
    Lumber,
    Magic,
    Rock,
}

impl ResourceKind {
    /// Every kind, in inventory-index order.
    pub const ALL: [ResourceKind; 6] = [
        Self::Gold,
        Self::Armor,
        Self::Ammo,
        Self::Lumber,
        Self::Magic,
        Self::Rock,
    ];

    /// Number of distinct resource kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// The wire name of this kind (lowercase, as it appears in files
    /// and registration blobs).
    pub fn name(self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Armor => "armor",
            Self::Ammo => "ammo",
            Self::Lumber => "lumber",
            Self::Magic => "magic",
            Self::Rock => "rock",
        }
    }

    /// Looks a kind up by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A quantity per [`ResourceKind`].
///
/// Used both for the immutable template loaded at startup and for each
/// lobby's live counters. Quantities are unsigned: a counter can never
/// go negative, and [`deduct`](Self::deduct) refuses to apply a request
/// it cannot fully cover, so there is no partial deduction either.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory([u64; ResourceKind::COUNT]);

impl Inventory {
    /// An inventory with every quantity zero.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the quantity of one kind.
    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.0[kind.index()]
    }

    /// Adds `amount` of `kind`, saturating on overflow.
    pub fn add(&mut self, kind: ResourceKind, amount: u64) {
        let slot = &mut self.0[kind.index()];
        *slot = slot.saturating_add(amount);
    }

    /// Sum of all quantities, saturating on overflow.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, n| acc.saturating_add(*n))
    }

    /// Returns `true` if every quantity of `request` fits within `self`.
    pub fn covers(&self, request: &Inventory) -> bool {
        self.0.iter().zip(request.0.iter()).all(|(have, want)| have >= want)
    }

    /// Subtracts `request` from `self` if fully covered.
    ///
    /// Returns `false` (leaving `self` untouched) when any quantity
    /// would go negative. Check-and-apply in one step so callers cannot
    /// leave a half-applied deduction behind.
    pub fn deduct(&mut self, request: &Inventory) -> bool {
        if !self.covers(request) {
            return false;
        }
        for (have, want) in self.0.iter_mut().zip(request.0.iter()) {
            *have -= want;
        }
        true
    }

    /// Parses the inventory configuration format: one
    /// `<resource-name>\t<quantity>` per line.
    ///
    /// Unknown names and malformed lines are errors — the file is loaded
    /// once at startup and a bad file is fatal. Blank lines are skipped.
    /// A kind named twice keeps the last quantity, matching a repeated
    /// assignment in the original format.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let mut inv = Inventory::empty();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let (name, amount) = match (tokens.next(), tokens.next(), tokens.next()) {
                (Some(name), Some(amount), None) => (name, amount),
                _ => return Err(ProtocolError::MalformedLine(line.to_string())),
            };
            let kind = ResourceKind::from_name(name)
                .ok_or_else(|| ProtocolError::UnknownResource(name.to_string()))?;
            let quantity: u64 = amount
                .parse()
                .map_err(|_| ProtocolError::InvalidAmount(amount.to_string()))?;
            inv.0[kind.index()] = quantity;
        }
        Ok(inv)
    }
}

impl Index<ResourceKind> for Inventory {
    type Output = u64;

    fn index(&self, kind: ResourceKind) -> &u64 {
        &self.0[kind.index()]
    }
}

impl FromIterator<(ResourceKind, u64)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (ResourceKind, u64)>>(iter: I) -> Self {
        let mut inv = Inventory::empty();
        for (kind, amount) in iter {
            inv.add(kind, amount);
        }
        inv
    }
}
