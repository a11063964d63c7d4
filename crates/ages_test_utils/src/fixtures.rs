//! Test fixtures and helpers.
//!
//! Pre-built catalogs, configurations and engines for consistent testing.

use std::sync::Arc;

use ages_core::prelude::*;

/// The base catalog shipped with `ages_core`.
pub const BASE_CATALOG_RON: &str = include_str!("../../ages_core/data/base_catalog.ron");

/// The base configuration shipped with `ages_core`.
pub const BASE_CONFIG_RON: &str = include_str!("../../ages_core/data/base_config.ron");

/// Parse the base catalog.
///
/// # Panics
///
/// Panics if the shipped catalog is invalid.
#[must_use]
pub fn base_catalog() -> Arc<Catalog> {
    Arc::new(Catalog::from_ron_str(BASE_CATALOG_RON).expect("base catalog must parse"))
}

/// Parse the base configuration.
///
/// # Panics
///
/// Panics if the shipped configuration is invalid.
#[must_use]
pub fn base_config() -> Arc<GameConfig> {
    Arc::new(GameConfig::from_ron_str(BASE_CONFIG_RON).expect("base config must parse"))
}

/// `count` players, all starting in despotism.
#[must_use]
pub fn players(count: u32) -> Vec<PlayerSetup> {
    (0..count)
        .map(|i| PlayerSetup::new(format!("Player {}", i + 1), Government::Despotism))
        .collect()
}

/// A fresh game on the base catalog and configuration.
///
/// # Panics
///
/// Panics if the base data cannot set up a game.
#[must_use]
pub fn base_engine(player_count: u32, seed: u64) -> TurnEngine {
    TurnEngine::new(base_config(), base_catalog(), &players(player_count), seed)
        .expect("base game must set up")
}

/// "Drama": urban building costing 5 material, 2 culture per worker.
#[must_use]
pub fn drama() -> CardTemplate {
    CardTemplate::new("Drama", CardCategory::UrbanBuilding, Age::I)
        .with_build_cost(ResourceKind::Material, 5)
        .with_production(ResourceKind::Culture, 2)
        .with_max_workers(2)
}

/// A small catalog for rule scenarios.
///
/// Contains "Drama", a free "Temple", a "Theology" that needs research,
/// a "Pyramids" wonder and an age II "Opera".
///
/// # Panics
///
/// Never, the templates are valid.
#[must_use]
pub fn scenario_catalog() -> Arc<Catalog> {
    let templates = vec![
        drama(),
        CardTemplate::new("Temple", CardCategory::UrbanBuilding, Age::I)
            .with_production(ResourceKind::Happy, 1)
            .with_max_workers(1),
        CardTemplate::new("Theology", CardCategory::UrbanBuilding, Age::I)
            .with_tech_cost(2)
            .with_production(ResourceKind::Culture, 1)
            .with_max_workers(2),
        CardTemplate::new("Pyramids", CardCategory::Wonder, Age::I)
            .with_build_cost(ResourceKind::Material, 3)
            .with_production(ResourceKind::Material, 1)
            .with_victory_points(2)
            .with_action_bonus(1, 0),
        CardTemplate::new("Opera", CardCategory::UrbanBuilding, Age::II)
            .with_production(ResourceKind::Culture, 3)
            .with_max_workers(1),
    ];
    Arc::new(Catalog::from_templates(templates).expect("scenario catalog is valid"))
}

/// Names of every card in [`scenario_catalog`].
pub const SCENARIO_CARDS: [&str; 5] = ["Drama", "Temple", "Theology", "Pyramids", "Opera"];

/// Configuration for rule scenarios: civil 3 / military 1, 5 material,
/// 2 workers, no corruption, no food upkeep, 3 turns, and a "Market"
/// exchange of 2 material for 1 food.
#[must_use]
pub fn scenario_config() -> GameConfig {
    GameConfig {
        exchanges: [(
            "Market".to_string(),
            ResourceExchange {
                cost: ResourceMap::new().with(ResourceKind::Material, 2),
                gain: ResourceMap::new().with(ResourceKind::Food, 1),
            },
        )]
        .into_iter()
        .collect(),
        governments: [(Government::Despotism, ActionAllowance::new(3, 1))]
            .into_iter()
            .collect(),
        corruption: CorruptionRule::None,
        max_turns: 3,
        ages: AgeSchedule {
            age_ii_from_turn: 2,
            age_iii_from_turn: 3,
            age_iii_turns: None,
        },
        starting_resources: ResourceMap::new().with(ResourceKind::Material, 5),
        starting_population: 2,
        max_population: 4,
        starting_cards: Vec::new(),
        ..GameConfig::default()
    }
}

/// A one-player scenario game, advanced into the action phase.
///
/// # Panics
///
/// Panics if the scenario cannot be set up.
#[must_use]
pub fn scenario_engine(config: GameConfig) -> TurnEngine {
    let mut engine = TurnEngine::new(Arc::new(config), scenario_catalog(), &players(1), 7)
        .expect("scenario game must set up");
    advance_to(&mut engine, Phase::ActionPhase);
    engine
}

/// Run phases until the engine's next phase is `phase`.
///
/// # Panics
///
/// Panics if the game ends first.
pub fn advance_to(engine: &mut TurnEngine, phase: Phase) {
    while engine.state().phase() != phase {
        engine.advance().expect("game ended before reaching phase");
    }
}

/// Run at least one phase, stopping at the following action phase.
///
/// # Panics
///
/// Panics if the game ends first.
pub fn next_action_phase(engine: &mut TurnEngine) {
    engine.advance().expect("game ended before the next action phase");
    advance_to(engine, Phase::ActionPhase);
}

/// Build request helper.
#[must_use]
pub fn build(category: CardCategory, name: &str) -> ActionRequest {
    ActionRequest::BuildCard {
        category,
        name: name.to_string(),
    }
}

/// Civil exchange request helper.
#[must_use]
pub fn exchange(name: &str) -> ActionRequest {
    ActionRequest::SpendCivilAction {
        effect: ActionEffect::Exchange {
            name: name.to_string(),
        },
    }
}

/// Assign request helper.
#[must_use]
pub fn assign(card_name: &str, count: u32) -> ActionRequest {
    ActionRequest::AssignWorker {
        card_name: card_name.to_string(),
        count,
    }
}
