//! Resource pools and the per-player ledger.
//!
//! All amounts are non-negative integers. The ledger is the only place
//! that mutates a player's pool, and every mutation is all-or-nothing:
//! a failed `spend` or `produce` leaves the pool exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Kinds of resource tracked on a player board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Feeds population growth.
    Food,
    /// Pays for buildings.
    Material,
    /// Pays for research.
    Science,
    /// Accumulates into victory points.
    Culture,
    /// Keeps the population content.
    Happy,
    /// Military strength.
    Strength,
}

impl ResourceKind {
    /// All kinds in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Food,
        Self::Material,
        Self::Science,
        Self::Culture,
        Self::Happy,
        Self::Strength,
    ];

    /// Order in which corruption consumes resources. Strength is never lost.
    pub const CORRUPTION_ORDER: [Self; 5] = [
        Self::Material,
        Self::Food,
        Self::Science,
        Self::Culture,
        Self::Happy,
    ];

    /// Lowercase name used in logs and snapshots.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Material => "material",
            Self::Science => "science",
            Self::Culture => "culture",
            Self::Happy => "happy",
            Self::Strength => "strength",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-negative amounts per resource kind.
///
/// Zero entries are never stored, so two maps with the same amounts
/// compare and hash equal regardless of how they were built.
///
/// # Example RON
///
/// ```ron
/// { Material: 5, Science: 1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ResourceKind, u32>", into = "BTreeMap<ResourceKind, u32>")]
pub struct ResourceMap(BTreeMap<ResourceKind, u32>);

impl ResourceMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder: set `kind` to `amount`.
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, amount: u32) -> Self {
        self.set(kind, amount);
        self
    }

    /// Amount of `kind` (zero when absent).
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    /// Set `kind` to `amount`.
    pub fn set(&mut self, kind: ResourceKind, amount: u32) {
        if amount == 0 {
            self.0.remove(&kind);
        } else {
            self.0.insert(kind, amount);
        }
    }

    /// Add `amount` of `kind`, saturating at `u32::MAX`.
    pub fn add(&mut self, kind: ResourceKind, amount: u32) {
        let current = self.get(kind);
        self.set(kind, current.saturating_add(amount));
    }

    /// Add every entry of `other`.
    pub fn add_all(&mut self, other: &Self) {
        for (kind, amount) in other.iter() {
            self.add(kind, amount);
        }
    }

    /// Every entry multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: u32) -> Self {
        self.iter()
            .map(|(kind, amount)| (kind, amount.saturating_mul(factor)))
            .collect()
    }

    /// Non-zero entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u32)> + '_ {
        self.0.iter().map(|(kind, amount)| (*kind, *amount))
    }

    /// Whether every amount is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all amounts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().map(|&amount| u64::from(amount)).sum()
    }
}

impl FromIterator<(ResourceKind, u32)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (ResourceKind, u32)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (kind, amount) in iter {
            map.add(kind, amount);
        }
        map
    }
}

impl From<BTreeMap<ResourceKind, u32>> for ResourceMap {
    fn from(raw: BTreeMap<ResourceKind, u32>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<ResourceMap> for BTreeMap<ResourceKind, u32> {
    fn from(map: ResourceMap) -> Self {
        map.0
    }
}

/// Signed per-resource change applied by [`ResourceLedger::produce`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDelta(BTreeMap<ResourceKind, i64>);

impl ResourceDelta {
    /// Create an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder: add `amount` (possibly negative) to `kind`.
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, amount: i64) -> Self {
        self.add(kind, amount);
        self
    }

    /// Add `amount` (possibly negative) to `kind`.
    pub fn add(&mut self, kind: ResourceKind, amount: i64) {
        *self.0.entry(kind).or_insert(0) += amount;
    }

    /// Per-kind change (zero when absent).
    #[must_use]
    pub fn get(&self, kind: ResourceKind) -> i64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    /// Entries in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, i64)> + '_ {
        self.0.iter().map(|(kind, amount)| (*kind, *amount))
    }
}

impl From<&ResourceMap> for ResourceDelta {
    fn from(gain: &ResourceMap) -> Self {
        Self(
            gain.iter()
                .map(|(kind, amount)| (kind, i64::from(amount)))
                .collect(),
        )
    }
}

/// A player's resource pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceLedger {
    pool: ResourceMap,
}

impl ResourceLedger {
    /// Create a ledger holding `initial`.
    #[must_use]
    pub fn new(initial: ResourceMap) -> Self {
        Self { pool: initial }
    }

    /// Current pool.
    #[must_use]
    pub fn pool(&self) -> &ResourceMap {
        &self.pool
    }

    /// Current amount of `kind`.
    #[must_use]
    pub fn amount(&self, kind: ResourceKind) -> u32 {
        self.pool.get(kind)
    }

    /// First resource in `costs` the pool cannot cover, as
    /// `(kind, required, available)`.
    #[must_use]
    pub fn shortfall(&self, costs: &ResourceMap) -> Option<(ResourceKind, u32, u32)> {
        costs.iter().find_map(|(kind, required)| {
            let available = self.amount(kind);
            (available < required).then_some((kind, required, available))
        })
    }

    /// Check if every cost can be paid.
    #[must_use]
    pub fn can_afford(&self, costs: &ResourceMap) -> bool {
        self.shortfall(costs).is_none()
    }

    /// Pay `costs`, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientResources`] naming the first
    /// resource that falls short; the pool is left untouched.
    pub fn spend(&mut self, costs: &ResourceMap) -> Result<()> {
        if let Some((resource, required, available)) = self.shortfall(costs) {
            return Err(GameError::InsufficientResources {
                resource,
                required: u64::from(required),
                available: u64::from(available),
            });
        }
        for (kind, cost) in costs.iter() {
            let current = self.amount(kind);
            self.pool.set(kind, current - cost);
        }
        Ok(())
    }

    /// Add a non-negative gain. Never fails.
    pub fn gain(&mut self, gain: &ResourceMap) {
        self.pool.add_all(gain);
    }

    /// Apply signed deltas atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientResources`] if any resulting amount
    /// would be negative; the pool is left untouched.
    pub fn produce(&mut self, deltas: &ResourceDelta) -> Result<()> {
        let mut next = self.pool.clone();
        for (kind, delta) in deltas.iter() {
            let available = i64::from(self.amount(kind));
            let value = available + delta;
            if value < 0 {
                return Err(GameError::InsufficientResources {
                    resource: kind,
                    required: delta.unsigned_abs(),
                    available: available.unsigned_abs(),
                });
            }
            next.set(kind, u32::try_from(value).unwrap_or(u32::MAX));
        }
        self.pool = next;
        Ok(())
    }

    /// Deduct up to `amount` following [`ResourceKind::CORRUPTION_ORDER`].
    ///
    /// The loss is capped by what the pool holds, so this never fails and
    /// never drives an amount below zero. Returns what was actually lost.
    pub fn pay_corruption(&mut self, amount: u32) -> ResourceMap {
        let mut remaining = amount;
        let mut lost = ResourceMap::new();
        for kind in ResourceKind::CORRUPTION_ORDER {
            if remaining == 0 {
                break;
            }
            let available = self.amount(kind);
            let taken = available.min(remaining);
            if taken > 0 {
                self.pool.set(kind, available - taken);
                lost.add(kind, taken);
                remaining -= taken;
            }
        }
        lost
    }
}
