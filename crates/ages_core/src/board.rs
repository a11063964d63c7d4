//! Player boards.
//!
//! A [`PlayerBoard`] owns one player's ledger, workers, action budget and
//! cards. It routes each [`ActionRequest`] to the sub-manager that owns the
//! affected state and never holds rules of its own beyond that routing.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actions::{ActionAllowance, ActionBudget, ActionKind};
use crate::cards::{Age, BuildTerms, CardInstance, CardManager, CardTemplate, Collection};
use crate::catalog::Catalog;
use crate::config::{FoodUpkeep, GameConfig, Government, ProductionMode, ProductionPolicy};
use crate::corruption::CorruptionPolicy;
use crate::error::{GameError, Result};
use crate::observation::{BoardSnapshot, CardSnapshot};
use crate::request::{ActionEffect, ActionRequest};
use crate::resources::{ResourceDelta, ResourceKind, ResourceLedger, ResourceMap};
use crate::workers::WorkerPool;

/// Seat index of a player, in turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who sits at a board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Display name.
    pub name: String,
    /// Starting government.
    #[serde(default)]
    pub government: Government,
}

impl PlayerSetup {
    /// Create a setup.
    #[must_use]
    pub fn new(name: impl Into<String>, government: Government) -> Self {
        Self {
            name: name.into(),
            government,
        }
    }
}

/// Read-only rules a request is validated against.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Card catalog.
    pub catalog: &'a Catalog,
    /// Game configuration.
    pub config: &'a GameConfig,
    /// Current age.
    pub age: Age,
}

/// Result of one board's production phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductionReport {
    /// Resources produced by cards.
    pub produced: ResourceMap,
    /// Food eaten by the population.
    pub food_consumed: u32,
    /// Resources lost to corruption afterwards.
    pub corruption: ResourceMap,
}

/// One player's board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerBoard {
    id: PlayerId,
    name: String,
    government: Government,
    ledger: ResourceLedger,
    workers: WorkerPool,
    budget: ActionBudget,
    cards: CardManager,
    corruption: u32,
    victory_points: u32,
}

impl PlayerBoard {
    /// Set up a board with the configured starting resources, population
    /// and cards.
    ///
    /// # Errors
    ///
    /// Fails if the government has no allowance, a starting card is not in
    /// the catalog or is a technology, or starting workers do not fit.
    pub fn new(
        id: PlayerId,
        setup: &PlayerSetup,
        config: &GameConfig,
        catalog: &Catalog,
    ) -> Result<Self> {
        let mut board = Self {
            id,
            name: setup.name.clone(),
            government: setup.government,
            ledger: ResourceLedger::new(config.starting_resources.clone()),
            workers: WorkerPool::new(config.starting_population),
            budget: ActionBudget::default(),
            cards: CardManager::new(),
            corruption: 0,
            victory_points: 0,
        };

        for starting in &config.starting_cards {
            let template = catalog.resolve(&starting.name)?;
            let collection = Collection::for_category(template.category).ok_or_else(|| {
                GameError::InvalidConfig(format!(
                    "starting card '{}' is a technology",
                    starting.name
                ))
            })?;
            board.cards.add_card(
                &mut board.ledger,
                template,
                collection,
                BuildTerms::starting(),
            )?;
            if starting.workers > 0 {
                let card = card_on_board(&mut board.cards, id, &starting.name)?;
                board.workers.assign(card, starting.workers)?;
            }
        }

        board.reset_actions(config)?;
        board.refresh_score(&config.corruption);
        Ok(board)
    }

    /// Player id.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Government type.
    #[must_use]
    pub const fn government(&self) -> Government {
        self.government
    }

    /// Resource ledger.
    #[must_use]
    pub const fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    /// Worker pool.
    #[must_use]
    pub const fn workers(&self) -> &WorkerPool {
        &self.workers
    }

    /// Action budget for the current turn.
    #[must_use]
    pub const fn budget(&self) -> &ActionBudget {
        &self.budget
    }

    /// Card collections and research.
    #[must_use]
    pub const fn cards(&self) -> &CardManager {
        &self.cards
    }

    /// Corruption level from the last upkeep.
    #[must_use]
    pub const fn corruption(&self) -> u32 {
        self.corruption
    }

    /// Victory points from the last upkeep.
    #[must_use]
    pub const fn victory_points(&self) -> u32 {
        self.victory_points
    }

    /// Government allowance plus bonuses from cards on the board.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`] if the government has no allowance.
    pub fn action_allowance(&self, config: &GameConfig) -> Result<ActionAllowance> {
        let base = config.allowance(self.government)?;
        Ok(self
            .cards
            .cards()
            .fold(base, |total, card| total + card.template().action_bonus))
    }

    /// Start-of-turn reset of the action budget.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidConfig`] if the government has no allowance.
    pub fn reset_actions(&mut self, config: &GameConfig) -> Result<()> {
        let allowance = self.action_allowance(config)?;
        self.budget.reset(allowance);
        Ok(())
    }

    /// Apply one request, all or nothing.
    ///
    /// The action budget is checked first, then the request validates and
    /// applies, and only then is the action consumed.
    ///
    /// # Errors
    ///
    /// Any rule violation; the board is unchanged.
    pub fn apply(&mut self, request: &ActionRequest, ctx: &RuleContext<'_>) -> Result<()> {
        let kind = request.action_kind(&ctx.config.action_costs);
        if let Some(kind) = kind {
            self.budget.ensure_available(kind)?;
        }
        self.execute(request, ctx)?;
        if let Some(kind) = kind {
            self.budget.consume(kind)?;
        }
        Ok(())
    }

    /// Check whether `request` would succeed, without changing the board.
    ///
    /// # Errors
    ///
    /// The error [`apply`](Self::apply) would return.
    pub fn validate(&self, request: &ActionRequest, ctx: &RuleContext<'_>) -> Result<()> {
        self.clone().apply(request, ctx)
    }

    fn execute(&mut self, request: &ActionRequest, ctx: &RuleContext<'_>) -> Result<()> {
        match request {
            ActionRequest::BuildCard { category, name } => {
                let template = ctx.catalog.resolve(name)?;
                let collection = Collection::for_category(*category).ok_or_else(|| {
                    GameError::InvalidRequest(format!(
                        "'{name}': technologies are researched, not built"
                    ))
                })?;
                ensure_available_in(template, ctx.age)?;
                self.cards
                    .add_card(&mut self.ledger, template, collection, BuildTerms::standard())?;
            }
            ActionRequest::AssignWorker { card_name, count } => {
                let card = card_on_board(&mut self.cards, self.id, card_name)?;
                self.workers.assign(card, *count)?;
            }
            ActionRequest::UnassignWorker { card_name, count } => {
                let card = card_on_board(&mut self.cards, self.id, card_name)?;
                self.workers.unassign(card, *count)?;
            }
            ActionRequest::SpendCivilAction { effect }
            | ActionRequest::SpendMilitaryAction { effect } => {
                self.apply_effect(effect, ctx.config)?;
            }
            ActionRequest::Research { name } => {
                let template = ctx.catalog.resolve(name)?;
                ensure_available_in(template, ctx.age)?;
                self.cards.research(&mut self.ledger, template)?;
            }
            ActionRequest::IncreasePopulation => {
                let cap = ctx.config.max_population;
                if self.workers.population() >= cap {
                    return Err(GameError::PopulationCapReached { cap });
                }
                let cost =
                    ResourceMap::new().with(ResourceKind::Food, ctx.config.population_food_cost);
                self.ledger.spend(&cost)?;
                self.workers.grow(cap)?;
            }
        }
        Ok(())
    }

    fn apply_effect(&mut self, effect: &ActionEffect, config: &GameConfig) -> Result<()> {
        match effect {
            ActionEffect::Pass => Ok(()),
            ActionEffect::Exchange { name } => {
                let exchange = config.exchange(name)?;
                self.ledger.spend(&exchange.cost)?;
                self.ledger.gain(&exchange.gain);
                Ok(())
            }
        }
    }

    /// What the board's cards produce this turn under `policy`.
    #[must_use]
    pub fn production(&self, policy: &ProductionPolicy) -> ResourceMap {
        let mut total = ResourceMap::new();
        for card in self.cards.cards() {
            let template = card.template();
            let output = match policy.mode_for(template.category) {
                ProductionMode::PerWorker => template.production.scaled(card.assigned_workers()),
                ProductionMode::Flat => template.production.clone(),
            };
            total.add_all(&output);
        }
        total
    }

    /// Production phase: one batched `produce` carrying card output and
    /// food upkeep, then corruption.
    ///
    /// Upkeep takes at most the food on hand after production.
    ///
    /// # Errors
    ///
    /// Propagates a failed `produce`; the ledger is unchanged in that case.
    pub fn run_production(
        &mut self,
        policy: &ProductionPolicy,
        upkeep: &FoodUpkeep,
        corruption: &dyn CorruptionPolicy,
    ) -> Result<ProductionReport> {
        let produced = self.production(policy);
        let food_on_hand = self
            .ledger
            .amount(ResourceKind::Food)
            .saturating_add(produced.get(ResourceKind::Food));
        let food_consumed = upkeep
            .consumption(self.workers.population())
            .min(food_on_hand);

        let mut delta = ResourceDelta::from(&produced);
        delta.add(ResourceKind::Food, -i64::from(food_consumed));
        self.ledger.produce(&delta)?;
        let owed = corruption.corruption(self.cards.building_counts());
        let lost = self.ledger.pay_corruption(owed);

        tracing::trace!(
            player = %self.id,
            produced = produced.total(),
            food_consumed,
            corruption = lost.total(),
            "Production resolved"
        );

        Ok(ProductionReport {
            produced,
            food_consumed,
            corruption: lost,
        })
    }

    /// Upkeep: recompute corruption level and victory points.
    pub fn refresh_score(&mut self, corruption: &dyn CorruptionPolicy) {
        self.corruption = corruption.corruption(self.cards.building_counts());
        self.victory_points = self
            .cards
            .cards()
            .map(|card| card.template().victory_points)
            .fold(self.ledger.amount(ResourceKind::Culture), u32::saturating_add);
    }

    /// Read-only view of the board.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let collection = |collection: Collection| {
            self.cards
                .collection(collection)
                .map(|card| CardSnapshot {
                    name: card.name().to_string(),
                    category: card.template().category,
                    assigned_workers: card.assigned_workers(),
                    max_workers: card.template().max_workers,
                })
                .collect::<Vec<_>>()
        };

        BoardSnapshot {
            player: self.id,
            name: self.name.clone(),
            government: self.government,
            resources: self.ledger.pool().clone(),
            population: self.workers.population(),
            assigned_workers: self.workers.assigned(),
            civil_budget: self.budget.budget(ActionKind::Civil),
            civil_remaining: self.budget.remaining(ActionKind::Civil),
            military_budget: self.budget.budget(ActionKind::Military),
            military_remaining: self.budget.remaining(ActionKind::Military),
            corruption: self.corruption,
            victory_points: self.victory_points,
            production_buildings: collection(Collection::ProductionBuildings),
            urban_buildings: collection(Collection::UrbanBuildings),
            wonders: collection(Collection::Wonders),
            leaders: collection(Collection::Leaders),
            researched: self.cards.researched().map(str::to_string).collect(),
        }
    }

    /// Verify the board's structural invariants.
    ///
    /// # Errors
    ///
    /// A description of the first violated invariant.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut on_cards = 0u32;
        let mut names = BTreeSet::new();
        for card in self.cards.cards() {
            if card.assigned_workers() > card.template().max_workers {
                return Err(format!(
                    "player {}: '{}' holds {} workers, max {}",
                    self.id,
                    card.name(),
                    card.assigned_workers(),
                    card.template().max_workers
                ));
            }
            if !names.insert(card.name()) {
                return Err(format!("player {}: duplicate card '{}'", self.id, card.name()));
            }
            on_cards += card.assigned_workers();
        }
        if on_cards != self.workers.assigned() {
            return Err(format!(
                "player {}: cards hold {on_cards} workers, pool says {}",
                self.id,
                self.workers.assigned()
            ));
        }
        if self.workers.assigned() > self.workers.population() {
            return Err(format!(
                "player {}: {} workers assigned, population {}",
                self.id,
                self.workers.assigned(),
                self.workers.population()
            ));
        }
        for kind in [ActionKind::Civil, ActionKind::Military] {
            if self.budget.used(kind) > self.budget.budget(kind) {
                return Err(format!(
                    "player {}: used {} {kind} actions of {}",
                    self.id,
                    self.budget.used(kind),
                    self.budget.budget(kind)
                ));
            }
        }
        Ok(())
    }
}

fn card_on_board<'a>(
    cards: &'a mut CardManager,
    player: PlayerId,
    name: &str,
) -> Result<&'a mut CardInstance> {
    cards.get_mut(name).ok_or_else(|| GameError::CardNotOnBoard {
        player,
        card: name.to_string(),
    })
}

fn ensure_available_in(template: &CardTemplate, age: Age) -> Result<()> {
    if template.age > age {
        return Err(GameError::CardNotAvailable {
            card: template.name.clone(),
            card_age: template.age,
            current: age,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardCategory;
    use crate::config::{ResourceExchange, StartingCard};
    use crate::corruption::CorruptionRule;

    fn catalog() -> Catalog {
        Catalog::from_templates(vec![
            CardTemplate::new("Farm", CardCategory::ProductionBuilding, Age::I)
                .with_production(ResourceKind::Food, 1)
                .with_max_workers(2),
            CardTemplate::new("Drama", CardCategory::UrbanBuilding, Age::I)
                .with_build_cost(ResourceKind::Material, 5)
                .with_production(ResourceKind::Culture, 2)
                .with_max_workers(2),
            CardTemplate::new("Colossus", CardCategory::Wonder, Age::I)
                .with_production(ResourceKind::Culture, 1)
                .with_victory_points(3),
        ])
        .unwrap()
    }

    fn config() -> GameConfig {
        GameConfig {
            corruption: CorruptionRule::None,
            starting_resources: ResourceMap::new().with(ResourceKind::Material, 5),
            starting_population: 3,
            starting_cards: vec![StartingCard {
                name: "Farm".to_string(),
                workers: 1,
            }],
            ..GameConfig::default()
        }
    }

    fn board(catalog: &Catalog, config: &GameConfig) -> PlayerBoard {
        PlayerBoard::new(
            PlayerId::new(0),
            &PlayerSetup::new("Ada", Government::Despotism),
            config,
            catalog,
        )
        .unwrap()
    }

    fn build(name: &str, category: CardCategory) -> ActionRequest {
        ActionRequest::BuildCard {
            category,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_new_board_places_starting_cards() {
        let (catalog, config) = (catalog(), config());
        let board = board(&catalog, &config);

        assert_eq!(board.workers().assigned(), 1);
        assert_eq!(board.workers().idle(), 2);
        assert_eq!(board.cards().get("Farm").unwrap().assigned_workers(), 1);
        assert_eq!(board.ledger().amount(ResourceKind::Material), 5);
        assert_eq!(board.budget().remaining(ActionKind::Civil), 4);
        board.check_invariants().unwrap();
    }

    #[test]
    fn test_failed_request_changes_nothing() {
        let (catalog, config) = (catalog(), config());
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };
        let before = board.clone();

        let err = board
            .apply(
                &ActionRequest::AssignWorker {
                    card_name: "Drama".to_string(),
                    count: 1,
                },
                &ctx,
            )
            .unwrap_err();

        assert!(matches!(err, GameError::CardNotOnBoard { .. }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_successful_request_consumes_one_action() {
        let (catalog, config) = (catalog(), config());
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };

        board
            .apply(&build("Drama", CardCategory::UrbanBuilding), &ctx)
            .unwrap();
        board
            .apply(
                &ActionRequest::UnassignWorker {
                    card_name: "Farm".to_string(),
                    count: 1,
                },
                &ctx,
            )
            .unwrap();

        assert_eq!(board.budget().used(ActionKind::Civil), 1);
        assert_eq!(board.workers().idle(), 3);
        board.check_invariants().unwrap();
    }

    #[test]
    fn test_validate_leaves_board_untouched() {
        let (catalog, config) = (catalog(), config());
        let board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };
        let before = board.clone();

        board
            .validate(&build("Drama", CardCategory::UrbanBuilding), &ctx)
            .unwrap();

        assert_eq!(board, before);
    }

    #[test]
    fn test_production_scales_with_workers() {
        let (catalog, config) = (catalog(), config());
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };
        board
            .apply(&build("Drama", CardCategory::UrbanBuilding), &ctx)
            .unwrap();
        board
            .apply(&build("Colossus", CardCategory::Wonder), &ctx)
            .unwrap();

        let idle = board.production(&config.production);
        assert_eq!(idle.get(ResourceKind::Culture), 1);
        assert_eq!(idle.get(ResourceKind::Food), 1);

        board
            .apply(
                &ActionRequest::AssignWorker {
                    card_name: "Drama".to_string(),
                    count: 2,
                },
                &ctx,
            )
            .unwrap();
        let report = board
            .run_production(&config.production, &config.food_upkeep, &config.corruption)
            .unwrap();

        assert_eq!(report.produced.get(ResourceKind::Culture), 5);
        assert!(report.corruption.is_empty());
        assert_eq!(board.ledger().amount(ResourceKind::Culture), 5);
    }

    #[test]
    fn test_corruption_is_paid_after_production() {
        let (catalog, config) = (catalog(), config());
        let mut board = board(&catalog, &config);
        let rule = CorruptionRule::Linear {
            free_buildings: 0,
            per_building: 2,
        };

        let report = board
            .run_production(&config.production, &config.food_upkeep, &rule)
            .unwrap();

        assert_eq!(report.produced.get(ResourceKind::Food), 1);
        assert_eq!(report.corruption.get(ResourceKind::Material), 2);
        assert_eq!(board.ledger().amount(ResourceKind::Material), 3);
        assert_eq!(board.ledger().amount(ResourceKind::Food), 1);
    }

    #[test]
    fn test_food_upkeep_is_floored_at_food_on_hand() {
        let (catalog, mut config) = (catalog(), config());
        config.food_upkeep = FoodUpkeep {
            free_population: 1,
            per_worker: 1,
        };
        config.starting_resources = ResourceMap::new().with(ResourceKind::Food, 1);
        let mut board = board(&catalog, &config);

        // Population 3 eats 2; the farm worker grows 1.
        let report = board
            .run_production(&config.production, &config.food_upkeep, &config.corruption)
            .unwrap();
        assert_eq!(report.produced.get(ResourceKind::Food), 1);
        assert_eq!(report.food_consumed, 2);
        assert_eq!(board.ledger().amount(ResourceKind::Food), 0);

        // Only the farm's 1 food is left to eat.
        let report = board
            .run_production(&config.production, &config.food_upkeep, &config.corruption)
            .unwrap();
        assert_eq!(report.food_consumed, 1);
        assert_eq!(board.ledger().amount(ResourceKind::Food), 0);
    }

    #[test]
    fn test_exchange_uses_configured_rate() {
        let catalog = catalog();
        let mut config = config();
        config.exchanges.insert(
            "Market".to_string(),
            ResourceExchange {
                cost: ResourceMap::new().with(ResourceKind::Material, 2),
                gain: ResourceMap::new().with(ResourceKind::Food, 1),
            },
        );
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };
        let exchange = |name: &str| ActionRequest::SpendCivilAction {
            effect: ActionEffect::Exchange {
                name: name.to_string(),
            },
        };

        board.apply(&exchange("Market"), &ctx).unwrap();
        assert_eq!(board.ledger().amount(ResourceKind::Material), 3);
        assert_eq!(board.ledger().amount(ResourceKind::Food), 1);

        let before = board.clone();
        let err = board.apply(&exchange("Gift"), &ctx).unwrap_err();
        assert!(matches!(err, GameError::InvalidRequest(_)));
        assert_eq!(board, before);
    }

    #[test]
    fn test_refresh_score_counts_culture_and_cards() {
        let (catalog, config) = (catalog(), config());
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };
        board
            .apply(&build("Colossus", CardCategory::Wonder), &ctx)
            .unwrap();
        board
            .run_production(&config.production, &config.food_upkeep, &config.corruption)
            .unwrap();

        board.refresh_score(&config.corruption);

        assert_eq!(board.victory_points(), 4);
        assert_eq!(board.snapshot().victory_points, 4);
    }

    #[test]
    fn test_allowance_includes_card_bonus() {
        let catalog = Catalog::from_templates(vec![CardTemplate::new(
            "Hammurabi",
            CardCategory::Leader,
            Age::I,
        )
        .with_action_bonus(1, 1)])
        .unwrap();
        let config = GameConfig::default();
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };

        board
            .apply(&build("Hammurabi", CardCategory::Leader), &ctx)
            .unwrap();
        assert_eq!(board.budget().budget(ActionKind::Civil), 4);

        board.reset_actions(&config).unwrap();
        assert_eq!(
            board.action_allowance(&config).unwrap(),
            ActionAllowance::new(5, 3)
        );
        assert_eq!(board.budget().remaining(ActionKind::Civil), 5);
    }

    #[test]
    fn test_technology_cannot_be_built() {
        let catalog = Catalog::from_templates(vec![CardTemplate::new(
            "Code of Laws",
            CardCategory::Technology,
            Age::I,
        )
        .with_tech_cost(1)])
        .unwrap();
        let config = GameConfig::default();
        let mut board = board(&catalog, &config);
        let ctx = RuleContext {
            catalog: &catalog,
            config: &config,
            age: Age::I,
        };

        let err = board
            .apply(&build("Code of Laws", CardCategory::Technology), &ctx)
            .unwrap_err();

        assert!(matches!(err, GameError::InvalidRequest(_)));
        assert_eq!(board.budget().used(ActionKind::Civil), 0);
    }
}
