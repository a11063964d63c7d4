//! Read-only views of the game for bots, trainers and logs.
//!
//! Snapshots are plain serde data: they round-trip through JSON and
//! bincode unchanged, and carry no references back into the engine.

use serde::{Deserialize, Serialize};

use crate::board::PlayerId;
use crate::cards::{Age, CardCategory};
use crate::config::Government;
use crate::engine::Phase;
use crate::error::{GameError, Result};
use crate::resources::{ResourceKind, ResourceMap};

/// One card as seen in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardSnapshot {
    /// Card name.
    pub name: String,
    /// Card category.
    pub category: CardCategory,
    /// Workers on the card.
    pub assigned_workers: u32,
    /// Worker slots.
    pub max_workers: u32,
}

/// Everything visible about one player board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Board owner.
    pub player: PlayerId,
    /// Display name.
    pub name: String,
    /// Government type.
    pub government: Government,
    /// Resource pool.
    pub resources: ResourceMap,
    /// Total population.
    pub population: u32,
    /// Workers assigned to cards.
    pub assigned_workers: u32,
    /// Civil actions this turn.
    pub civil_budget: u32,
    /// Civil actions left this turn.
    pub civil_remaining: u32,
    /// Military actions this turn.
    pub military_budget: u32,
    /// Military actions left this turn.
    pub military_remaining: u32,
    /// Corruption level from the last upkeep.
    pub corruption: u32,
    /// Victory points from the last upkeep.
    pub victory_points: u32,
    /// Production buildings.
    pub production_buildings: Vec<CardSnapshot>,
    /// Urban buildings.
    pub urban_buildings: Vec<CardSnapshot>,
    /// Wonders.
    pub wonders: Vec<CardSnapshot>,
    /// Leaders.
    pub leaders: Vec<CardSnapshot>,
    /// Researched card names, sorted.
    pub researched: Vec<String>,
}

impl BoardSnapshot {
    /// Number of values [`feature_vector`](Self::feature_vector) returns.
    pub const FEATURES: usize = ResourceKind::ALL.len() + 13;

    /// Flatten the board into a fixed-order integer vector.
    ///
    /// Layout: resources in [`ResourceKind::ALL`] order, population,
    /// assigned workers, civil budget and remaining, military budget and
    /// remaining, corruption, victory points, the four collection sizes,
    /// researched count.
    #[must_use]
    pub fn feature_vector(&self) -> Vec<i64> {
        fn count(cards: &[CardSnapshot]) -> i64 {
            i64::try_from(cards.len()).unwrap_or(i64::MAX)
        }

        let mut features: Vec<i64> = ResourceKind::ALL
            .iter()
            .map(|kind| i64::from(self.resources.get(*kind)))
            .collect();
        features.extend([
            i64::from(self.population),
            i64::from(self.assigned_workers),
            i64::from(self.civil_budget),
            i64::from(self.civil_remaining),
            i64::from(self.military_budget),
            i64::from(self.military_remaining),
            i64::from(self.corruption),
            i64::from(self.victory_points),
            count(&self.production_buildings),
            count(&self.urban_buildings),
            count(&self.wonders),
            count(&self.leaders),
            i64::try_from(self.researched.len()).unwrap_or(i64::MAX),
        ]);
        features
    }

    /// All cards across collections.
    pub fn cards(&self) -> impl Iterator<Item = &CardSnapshot> {
        self.production_buildings
            .iter()
            .chain(&self.urban_buildings)
            .chain(&self.wonders)
            .chain(&self.leaders)
    }
}

/// Whole-game observation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    /// Current turn, starting at 1.
    pub turn: u32,
    /// Current age.
    pub age: Age,
    /// Next phase to run.
    pub phase: Phase,
    /// Whether the game is over.
    pub terminal: bool,
    /// Player holding the action slot, during the action phase.
    pub active_player: Option<PlayerId>,
    /// Boards in turn order.
    pub players: Vec<BoardSnapshot>,
}

impl Observation {
    /// Board of `player`, if seated.
    #[must_use]
    pub fn board(&self, player: PlayerId) -> Option<&BoardSnapshot> {
        self.players.iter().find(|board| board.player == player)
    }

    /// Global features (turn, age, terminal) followed by `player`'s board.
    #[must_use]
    pub fn feature_vector(&self, player: PlayerId) -> Option<Vec<i64>> {
        let board = self.board(player)?;
        let mut features = vec![
            i64::from(self.turn),
            i64::from(self.age.index()),
            i64::from(self.terminal),
        ];
        features.extend(board.feature_vector());
        Some(features)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            GameError::InvalidState(format!("Failed to serialize observation: {}", e))
        })
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid observation.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize observation: {}", e))
        })
    }
}
