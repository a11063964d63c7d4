//! Corruption: the per-turn resource loss from sprawling civilizations.
//!
//! A corruption policy turns a board's building counts into an amount,
//! which the ledger then pays in priority order (see
//! [`ResourceLedger::pay_corruption`](crate::resources::ResourceLedger::pay_corruption)).

use serde::{Deserialize, Serialize};

/// Building counts a corruption policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct BuildingCounts {
    /// Production buildings on the board.
    pub production: u32,
    /// Urban buildings on the board.
    pub urban: u32,
}

impl BuildingCounts {
    /// Total buildings.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.production + self.urban
    }
}

/// Computes the corruption amount a board pays each production phase.
pub trait CorruptionPolicy {
    /// Corruption owed for the given building counts.
    fn corruption(&self, counts: BuildingCounts) -> u32;
}

/// Built-in corruption rules selectable from configuration.
///
/// # Example RON
///
/// ```ron
/// Tiered(tiers: [(6, 1), (9, 3), (12, 6)])
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorruptionRule {
    /// No corruption.
    None,
    /// Every building past `free_buildings` costs `per_building`.
    Linear {
        /// Buildings that cost nothing.
        free_buildings: u32,
        /// Corruption per building past the free allowance.
        per_building: u32,
    },
    /// Penalty of the highest `(threshold, penalty)` tier reached.
    Tiered {
        /// Tiers as `(building threshold, penalty)`.
        tiers: Vec<(u32, u32)>,
    },
}

impl Default for CorruptionRule {
    fn default() -> Self {
        Self::Linear {
            free_buildings: 4,
            per_building: 1,
        }
    }
}

impl CorruptionPolicy for CorruptionRule {
    fn corruption(&self, counts: BuildingCounts) -> u32 {
        let buildings = counts.total();
        match self {
            Self::None => 0,
            Self::Linear {
                free_buildings,
                per_building,
            } => buildings
                .saturating_sub(*free_buildings)
                .saturating_mul(*per_building),
            Self::Tiered { tiers } => tiers
                .iter()
                .filter(|(threshold, _)| buildings >= *threshold)
                .map(|(_, penalty)| *penalty)
                .max()
                .unwrap_or(0),
        }
    }
}

impl<F> CorruptionPolicy for F
where
    F: Fn(BuildingCounts) -> u32,
{
    fn corruption(&self, counts: BuildingCounts) -> u32 {
        self(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(production: u32, urban: u32) -> BuildingCounts {
        BuildingCounts { production, urban }
    }

    #[test]
    fn test_linear_free_allowance() {
        let rule = CorruptionRule::default();
        assert_eq!(rule.corruption(counts(2, 2)), 0);
        assert_eq!(rule.corruption(counts(4, 3)), 3);
    }

    #[test]
    fn test_tiered_takes_highest_reached() {
        let rule = CorruptionRule::Tiered {
            tiers: vec![(6, 1), (9, 3), (12, 6)],
        };
        assert_eq!(rule.corruption(counts(3, 2)), 0);
        assert_eq!(rule.corruption(counts(5, 5)), 3);
        assert_eq!(rule.corruption(counts(10, 10)), 6);
    }

    #[test]
    fn test_closure_policy() {
        let double = |c: BuildingCounts| c.urban * 2;
        assert_eq!(double.corruption(counts(7, 2)), 4);
        assert_eq!(CorruptionRule::None.corruption(counts(50, 50)), 0);
    }
}
