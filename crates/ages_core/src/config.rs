//! Game configuration.
//!
//! One immutable [`GameConfig`] is handed to the engine at game start.
//! Every field has a default, so RON documents only need to name what
//! they change.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionAllowance, ActionKind};
use crate::cards::{Age, CardCategory};
use crate::corruption::CorruptionRule;
use crate::error::{GameError, Result};
use crate::resources::{ResourceKind, ResourceMap};

/// Government types. Each maps to an action allowance in
/// [`GameConfig::governments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Government {
    /// Starting government.
    #[default]
    Despotism,
    /// Monarchy.
    Monarchy,
    /// Theocracy.
    Theocracy,
    /// Constitutional monarchy.
    ConstitutionalMonarchy,
    /// Republic.
    Republic,
    /// Democracy.
    Democracy,
    /// Communism.
    Communism,
    /// Fundamentalism.
    Fundamentalism,
}

impl fmt::Display for Government {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a card's production scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductionMode {
    /// `assigned_workers × production`.
    PerWorker,
    /// Full production regardless of workers.
    Flat,
}

/// Production mode per card category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionPolicy {
    /// Production buildings.
    pub production_building: ProductionMode,
    /// Urban buildings.
    pub urban_building: ProductionMode,
    /// Wonders.
    pub wonder: ProductionMode,
    /// Leaders.
    pub leader: ProductionMode,
    /// Technologies. They never sit in a collection, so this only matters
    /// to callers computing production for arbitrary templates.
    pub technology: ProductionMode,
}

impl Default for ProductionPolicy {
    fn default() -> Self {
        Self {
            production_building: ProductionMode::PerWorker,
            urban_building: ProductionMode::PerWorker,
            wonder: ProductionMode::Flat,
            leader: ProductionMode::Flat,
            technology: ProductionMode::Flat,
        }
    }
}

impl ProductionPolicy {
    /// Mode for `category`.
    #[must_use]
    pub const fn mode_for(&self, category: CardCategory) -> ProductionMode {
        match category {
            CardCategory::ProductionBuilding => self.production_building,
            CardCategory::UrbanBuilding => self.urban_building,
            CardCategory::Wonder => self.wonder,
            CardCategory::Leader => self.leader,
            CardCategory::Technology => self.technology,
        }
    }
}

/// Turns at which the game moves into later ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeSchedule {
    /// First turn of age II.
    pub age_ii_from_turn: u32,
    /// First turn of age III.
    pub age_iii_from_turn: u32,
    /// Game ends once this many turns of age III are played.
    pub age_iii_turns: Option<u32>,
}

impl Default for AgeSchedule {
    fn default() -> Self {
        Self {
            age_ii_from_turn: 8,
            age_iii_from_turn: 15,
            age_iii_turns: None,
        }
    }
}

impl AgeSchedule {
    /// Age in effect during `turn`.
    #[must_use]
    pub const fn age_for_turn(&self, turn: u32) -> Age {
        if turn >= self.age_iii_from_turn {
            Age::III
        } else if turn >= self.age_ii_from_turn {
            Age::II
        } else {
            Age::I
        }
    }

    /// Whether the final age has run its course once `turn` is complete.
    #[must_use]
    pub fn exhausted_after(&self, turn: u32) -> bool {
        self.age_iii_turns.is_some_and(|limit| {
            turn >= self.age_iii_from_turn && turn - self.age_iii_from_turn + 1 >= limit
        })
    }
}

/// Which action budget each request draws from. `None` makes it free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCostTable {
    /// Building a card.
    pub build_card: Option<ActionKind>,
    /// Researching a card.
    pub research: Option<ActionKind>,
    /// Assigning workers.
    pub assign_worker: Option<ActionKind>,
    /// Removing workers.
    pub unassign_worker: Option<ActionKind>,
    /// Growing population.
    pub increase_population: Option<ActionKind>,
}

impl Default for ActionCostTable {
    fn default() -> Self {
        Self {
            build_card: Some(ActionKind::Civil),
            research: Some(ActionKind::Civil),
            assign_worker: Some(ActionKind::Civil),
            unassign_worker: None,
            increase_population: Some(ActionKind::Civil),
        }
    }
}

/// A card every player starts with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartingCard {
    /// Catalog name.
    pub name: String,
    /// Workers placed on it at setup.
    #[serde(default)]
    pub workers: u32,
}

/// A fixed trade a player may make by spending one action.
///
/// # Example RON
///
/// ```ron
/// (cost: { Material: 2 }, gain: { Food: 1 })
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceExchange {
    /// Resources paid.
    pub cost: ResourceMap,
    /// Resources received.
    pub gain: ResourceMap,
}

/// Food eaten by the population during each production phase.
///
/// Consumption is `(population - free_population) * per_worker`, and
/// never takes more food than the board holds after production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodUpkeep {
    /// Population fed for free.
    pub free_population: u32,
    /// Food per worker above the free population.
    pub per_worker: u32,
}

impl FoodUpkeep {
    /// Food owed by a population of `population`.
    #[must_use]
    pub const fn consumption(&self, population: u32) -> u32 {
        population
            .saturating_sub(self.free_population)
            .saturating_mul(self.per_worker)
    }
}

/// Complete game configuration.
///
/// # Example RON
///
/// ```ron
/// GameConfig(
///     max_turns: 12,
///     victory_point_target: Some(40),
///     governments: { Despotism: (civil: 3, military: 1) },
///     corruption: Linear(free_buildings: 6, per_building: 1),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Action allowance per government type.
    pub governments: BTreeMap<Government, ActionAllowance>,
    /// Corruption rule applied during production.
    pub corruption: CorruptionRule,
    /// Production scaling per category.
    pub production: ProductionPolicy,
    /// Game ends when a player reaches this many victory points.
    pub victory_point_target: Option<u32>,
    /// Game ends after this turn.
    pub max_turns: u32,
    /// Age progression.
    pub ages: AgeSchedule,
    /// Action kind consumed per request.
    pub action_costs: ActionCostTable,
    /// Resources every player starts with.
    pub starting_resources: ResourceMap,
    /// Workers every player starts with.
    pub starting_population: u32,
    /// Population cap.
    pub max_population: u32,
    /// Food paid per population increase.
    pub population_food_cost: u32,
    /// Food eaten each production phase.
    pub food_upkeep: FoodUpkeep,
    /// Trades available through civil and military actions, by name.
    pub exchanges: BTreeMap<String, ResourceExchange>,
    /// Cards every player starts with.
    pub starting_cards: Vec<StartingCard>,
    /// Cap on requests asked of one player per action slot by
    /// [`TurnEngine::run_turn`](crate::engine::TurnEngine::run_turn).
    pub max_requests_per_slot: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        let governments = [
            (Government::Despotism, ActionAllowance::new(4, 2)),
            (Government::Monarchy, ActionAllowance::new(5, 3)),
            (Government::Theocracy, ActionAllowance::new(4, 3)),
            (Government::ConstitutionalMonarchy, ActionAllowance::new(6, 3)),
            (Government::Republic, ActionAllowance::new(7, 2)),
            (Government::Democracy, ActionAllowance::new(7, 3)),
            (Government::Communism, ActionAllowance::new(5, 5)),
            (Government::Fundamentalism, ActionAllowance::new(5, 5)),
        ]
        .into_iter()
        .collect();

        Self {
            governments,
            corruption: CorruptionRule::default(),
            production: ProductionPolicy::default(),
            victory_point_target: None,
            max_turns: 20,
            ages: AgeSchedule::default(),
            action_costs: ActionCostTable::default(),
            starting_resources: ResourceMap::new()
                .with(ResourceKind::Food, 2)
                .with(ResourceKind::Material, 2)
                .with(ResourceKind::Science, 2)
                .with(ResourceKind::Strength, 1),
            starting_population: 5,
            max_population: 18,
            population_food_cost: 2,
            food_upkeep: FoodUpkeep::default(),
            exchanges: BTreeMap::new(),
            starting_cards: Vec::new(),
            max_requests_per_slot: 32,
        }
    }
}

impl GameConfig {
    /// Parse and validate a RON document.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`] on parse or validation failure.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)
            .map_err(|e| GameError::InvalidConfig(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`] naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        fn fail(message: impl Into<String>) -> Result<()> {
            Err(GameError::InvalidConfig(message.into()))
        }

        if self.governments.is_empty() {
            return fail("at least one government must be configured");
        }
        if self.max_turns == 0 {
            return fail("max_turns must be at least 1");
        }
        if self.ages.age_ii_from_turn < 2 || self.ages.age_iii_from_turn <= self.ages.age_ii_from_turn
        {
            return fail(format!(
                "age thresholds must satisfy 2 <= age II ({}) < age III ({})",
                self.ages.age_ii_from_turn, self.ages.age_iii_from_turn
            ));
        }
        if self.ages.age_iii_turns == Some(0) {
            return fail("age_iii_turns must be at least 1");
        }
        if self.starting_population > self.max_population {
            return fail(format!(
                "starting_population {} exceeds max_population {}",
                self.starting_population, self.max_population
            ));
        }
        let starting_workers: u32 = self.starting_cards.iter().map(|card| card.workers).sum();
        if starting_workers > self.starting_population {
            return fail(format!(
                "starting cards need {starting_workers} workers, population is {}",
                self.starting_population
            ));
        }
        if self.max_requests_per_slot == 0 {
            return fail("max_requests_per_slot must be at least 1");
        }
        for (name, exchange) in &self.exchanges {
            if exchange.cost.total() == 0 {
                return fail(format!("exchange '{name}' costs nothing"));
            }
            if exchange.gain.total() == 0 {
                return fail(format!("exchange '{name}' gives nothing"));
            }
        }
        Ok(())
    }

    /// Look up a configured exchange.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidRequest`] if no exchange has that name.
    pub fn exchange(&self, name: &str) -> Result<&ResourceExchange> {
        self.exchanges
            .get(name)
            .ok_or_else(|| GameError::InvalidRequest(format!("no exchange named '{name}'")))
    }

    /// Action allowance for `government`.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`] if the government has no entry.
    pub fn allowance(&self, government: Government) -> Result<ActionAllowance> {
        self.governments.get(&government).copied().ok_or_else(|| {
            GameError::InvalidConfig(format!("no action allowance for {government}"))
        })
    }
}
