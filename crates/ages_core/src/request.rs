//! Player action requests.
//!
//! Requests name cards by string; the board resolves names against the
//! catalog before any typed mutation runs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::ActionKind;
use crate::cards::CardCategory;
use crate::config::ActionCostTable;

/// Effect of spending an action on something other than a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionEffect {
    /// Spend the action for nothing.
    Pass,
    /// Trade resources at a rate named in
    /// [`GameConfig::exchanges`](crate::config::GameConfig::exchanges).
    Exchange {
        /// Configured exchange name.
        name: String,
    },
}

/// A request submitted for one player during the action phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionRequest {
    /// Build the named card into the collection for `category`.
    BuildCard {
        /// Target collection.
        category: CardCategory,
        /// Catalog name.
        name: String,
    },
    /// Put idle workers on a card.
    AssignWorker {
        /// Card on this board.
        card_name: String,
        /// Workers to move.
        count: u32,
    },
    /// Take workers off a card.
    UnassignWorker {
        /// Card on this board.
        card_name: String,
        /// Workers to move.
        count: u32,
    },
    /// Spend a civil action on a non-card effect.
    SpendCivilAction {
        /// What the action does.
        effect: ActionEffect,
    },
    /// Spend a military action on a non-card effect.
    SpendMilitaryAction {
        /// What the action does.
        effect: ActionEffect,
    },
    /// Research the named card by paying its tech cost in science.
    Research {
        /// Catalog name.
        name: String,
    },
    /// Pay food for one more worker.
    IncreasePopulation,
}

impl ActionRequest {
    /// Action budget this request draws from under `costs`.
    #[must_use]
    pub const fn action_kind(&self, costs: &ActionCostTable) -> Option<ActionKind> {
        match self {
            Self::BuildCard { .. } => costs.build_card,
            Self::AssignWorker { .. } => costs.assign_worker,
            Self::UnassignWorker { .. } => costs.unassign_worker,
            Self::SpendCivilAction { .. } => Some(ActionKind::Civil),
            Self::SpendMilitaryAction { .. } => Some(ActionKind::Military),
            Self::Research { .. } => costs.research,
            Self::IncreasePopulation => costs.increase_population,
        }
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildCard { category, name } => write!(f, "build {category} '{name}'"),
            Self::AssignWorker { card_name, count } => {
                write!(f, "assign {count} worker(s) to '{card_name}'")
            }
            Self::UnassignWorker { card_name, count } => {
                write!(f, "unassign {count} worker(s) from '{card_name}'")
            }
            Self::SpendCivilAction { .. } => f.write_str("spend civil action"),
            Self::SpendMilitaryAction { .. } => f.write_str("spend military action"),
            Self::Research { name } => write!(f, "research '{name}'"),
            Self::IncreasePopulation => f.write_str("increase population"),
        }
    }
}
