//! End-to-end rule scenarios driven through the public engine API.

use std::sync::Arc;

use ages_core::prelude::*;
use ages_test_utils::fixtures::{
    advance_to, assign, base_catalog, base_config, base_engine, build, exchange, next_action_phase,
    players, scenario_catalog, scenario_config, scenario_engine,
};
use ages_test_utils::init_test_tracing;

const P0: PlayerId = PlayerId::new(0);

fn pass_civil() -> ActionRequest {
    ActionRequest::SpendCivilAction {
        effect: ActionEffect::Pass,
    }
}

#[test]
fn test_new_game_starts_at_turn_one_in_age_one() {
    let engine = base_engine(2, 1);

    assert_eq!(engine.state().turn(), 1);
    assert_eq!(engine.state().age(), Age::I);
    assert_eq!(engine.state().phase(), Phase::TurnStart);
    assert!(!engine.state().is_terminal());
    engine.state().check_invariants().unwrap();
}

#[test]
fn test_base_setup_places_starting_cards() {
    let engine = base_engine(1, 1);
    let snapshot = engine.snapshot(P0).unwrap();

    assert_eq!(snapshot.population, 6);
    assert_eq!(snapshot.assigned_workers, 5);
    assert_eq!(snapshot.production_buildings.len(), 2);
    assert_eq!(snapshot.urban_buildings.len(), 2);
    assert_eq!(snapshot.civil_budget, 4);
    assert_eq!(snapshot.military_budget, 2);
    assert_eq!(snapshot.resources.get(ResourceKind::Material), 2);
}

#[test]
fn test_drama_scenario() {
    init_test_tracing();
    let mut engine = scenario_engine(scenario_config());

    let snapshot = engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Drama"))
        .unwrap();
    assert_eq!(snapshot.urban_buildings[0].name, "Drama");
    assert_eq!(snapshot.resources.get(ResourceKind::Material), 0);
    assert_eq!(snapshot.civil_remaining, 2);

    let duplicate = engine.submit(P0, &build(CardCategory::UrbanBuilding, "Drama"));
    assert!(matches!(duplicate, Err(GameError::DuplicateCard(_))));
    assert_eq!(engine.snapshot(P0).unwrap().civil_remaining, 2);

    engine.submit(P0, &pass_civil()).unwrap();
    engine.submit(P0, &pass_civil()).unwrap();

    let exhausted = engine.submit(P0, &build(CardCategory::UrbanBuilding, "Temple"));
    assert!(matches!(
        exhausted,
        Err(GameError::ActionBudgetExceeded {
            kind: ActionKind::Civil,
            budget: 3
        })
    ));
    assert!(!engine.snapshot(P0).unwrap().cards().any(|c| c.name == "Temple"));
}

#[test]
fn test_budget_resets_at_turn_start() {
    let mut engine = scenario_engine(scenario_config());
    engine.submit(P0, &pass_civil()).unwrap();
    engine
        .submit(
            P0,
            &ActionRequest::SpendMilitaryAction {
                effect: ActionEffect::Pass,
            },
        )
        .unwrap();

    next_action_phase(&mut engine);

    let snapshot = engine.snapshot(P0).unwrap();
    assert_eq!(engine.state().turn(), 2);
    assert_eq!(snapshot.civil_remaining, snapshot.civil_budget);
    assert_eq!(snapshot.military_remaining, snapshot.military_budget);
    let budget = engine.state().players()[0].budget();
    assert_eq!(budget.used(ActionKind::Civil), 0);
    assert_eq!(budget.used(ActionKind::Military), 0);
}

#[test]
fn test_production_is_linear_in_workers() {
    let mut engine = scenario_engine(scenario_config());
    engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Drama"))
        .unwrap();

    // No workers on Drama: nothing produced.
    next_action_phase(&mut engine);
    assert_eq!(
        engine
            .snapshot(P0)
            .unwrap()
            .resources
            .get(ResourceKind::Culture),
        0
    );

    engine.submit(P0, &assign("Drama", 2)).unwrap();
    advance_to(&mut engine, Phase::Production);
    let report = engine.advance().unwrap();

    assert!(report.events.iter().any(|event| matches!(
        event,
        EngineEvent::Produced { report, .. } if report.produced.get(ResourceKind::Culture) == 4
    )));
    assert_eq!(
        engine
            .snapshot(P0)
            .unwrap()
            .resources
            .get(ResourceKind::Culture),
        4
    );
}

#[test]
fn test_assign_over_capacity_is_rejected() {
    let mut engine = scenario_engine(GameConfig {
        starting_population: 4,
        ..scenario_config()
    });
    engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Drama"))
        .unwrap();

    let err = engine.submit(P0, &assign("Drama", 3)).unwrap_err();

    assert!(matches!(err, GameError::WorkerCapacity { max_workers: 2, .. }));
    let snapshot = engine.snapshot(P0).unwrap();
    assert_eq!(snapshot.urban_buildings[0].assigned_workers, 0);
    assert_eq!(snapshot.assigned_workers, 0);
    assert_eq!(snapshot.civil_remaining, 2);
}

#[test]
fn test_cross_board_and_unknown_cards() {
    let mut engine = scenario_engine(scenario_config());

    assert!(matches!(
        engine.submit(P0, &assign("Drama", 1)),
        Err(GameError::CardNotOnBoard { .. })
    ));
    assert!(matches!(
        engine.submit(P0, &build(CardCategory::Wonder, "Atlantis")),
        Err(GameError::CardNotFound(_))
    ));
    assert!(matches!(
        engine.submit(P0, &build(CardCategory::Wonder, "Drama")),
        Err(GameError::CardTypeMismatch { .. })
    ));
}

#[test]
fn test_research_then_build() {
    let mut engine = scenario_engine(GameConfig {
        starting_resources: ResourceMap::new()
            .with(ResourceKind::Science, 2)
            .with(ResourceKind::Material, 1),
        ..scenario_config()
    });

    assert!(matches!(
        engine.submit(P0, &build(CardCategory::UrbanBuilding, "Theology")),
        Err(GameError::TechnologyNotResearched(_))
    ));

    let snapshot = engine
        .submit(
            P0,
            &ActionRequest::Research {
                name: "Theology".to_string(),
            },
        )
        .unwrap();
    assert_eq!(snapshot.researched, vec!["Theology".to_string()]);
    assert_eq!(snapshot.resources.get(ResourceKind::Science), 0);

    engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Theology"))
        .unwrap();
}

#[test]
fn test_later_age_cards_are_locked() {
    let mut engine = scenario_engine(scenario_config());

    let err = engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Opera"))
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::CardNotAvailable {
            card_age: Age::II,
            current: Age::I,
            ..
        }
    ));

    next_action_phase(&mut engine);
    assert_eq!(engine.state().age(), Age::II);
    engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Opera"))
        .unwrap();
}

#[test]
fn test_increase_population() {
    let mut engine = scenario_engine(GameConfig {
        starting_resources: ResourceMap::new().with(ResourceKind::Food, 5),
        max_population: 3,
        ..scenario_config()
    });

    let snapshot = engine.submit(P0, &ActionRequest::IncreasePopulation).unwrap();
    assert_eq!(snapshot.population, 3);
    assert_eq!(snapshot.resources.get(ResourceKind::Food), 3);

    assert!(matches!(
        engine.submit(P0, &ActionRequest::IncreasePopulation),
        Err(GameError::PopulationCapReached { cap: 3 })
    ));
    assert_eq!(
        engine.snapshot(P0).unwrap().resources.get(ResourceKind::Food),
        3
    );
}

#[test]
fn test_wonder_bonus_applies_next_turn() {
    let mut engine = scenario_engine(scenario_config());
    engine
        .submit(P0, &build(CardCategory::Wonder, "Pyramids"))
        .unwrap();
    assert_eq!(engine.snapshot(P0).unwrap().civil_budget, 3);

    next_action_phase(&mut engine);

    let snapshot = engine.snapshot(P0).unwrap();
    assert_eq!(snapshot.civil_budget, 4);
    // Wonders produce flat: 2 material left after the build, +1.
    assert_eq!(snapshot.resources.get(ResourceKind::Material), 3);
    assert_eq!(snapshot.victory_points, 2);
}

#[test]
fn test_game_ends_after_max_turns() {
    let mut engine = scenario_engine(scenario_config());

    while !engine.state().is_terminal() {
        engine.advance().unwrap();
    }

    assert_eq!(engine.state().turn(), 3);
    let outcome = engine.state().outcome().unwrap();
    assert_eq!(outcome.reason, EndReason::TurnLimit);
    assert_eq!(outcome.winner(), Some(P0));
    assert!(matches!(engine.advance(), Err(GameError::GameFinished(3))));
    assert!(matches!(
        engine.submit(P0, &pass_civil()),
        Err(GameError::GameFinished(3))
    ));
}

#[test]
fn test_victory_point_target_ends_game() {
    let mut engine = scenario_engine(GameConfig {
        victory_point_target: Some(2),
        max_turns: 10,
        ..scenario_config()
    });
    engine
        .submit(P0, &build(CardCategory::Wonder, "Pyramids"))
        .unwrap();

    while !engine.state().is_terminal() {
        engine.advance().unwrap();
    }

    assert_eq!(engine.state().turn(), 1);
    assert_eq!(
        engine.state().outcome().unwrap().reason,
        EndReason::VictoryPointTarget
    );
}

#[test]
fn test_turn_order_is_enforced() {
    let mut engine = TurnEngine::new(
        Arc::new(scenario_config()),
        scenario_catalog(),
        &players(2),
        3,
    )
    .unwrap();
    let p1 = PlayerId::new(1);

    assert!(matches!(
        engine.submit(P0, &pass_civil()),
        Err(GameError::WrongPhase {
            expected: Phase::ActionPhase,
            actual: Phase::TurnStart
        })
    ));

    advance_to(&mut engine, Phase::ActionPhase);
    assert!(matches!(
        engine.submit(p1, &pass_civil()),
        Err(GameError::NotPlayersTurn { .. })
    ));

    engine.end_player_turn(P0).unwrap();
    assert_eq!(engine.state().active_player(), Some(p1));
    engine.submit(p1, &pass_civil()).unwrap();
    engine.end_player_turn(p1).unwrap();
    assert_eq!(engine.state().phase(), Phase::Upkeep);
    assert!(matches!(
        engine.submit(PlayerId::new(7), &pass_civil()),
        Err(GameError::WrongPhase { .. })
    ));
}

#[test]
fn test_run_turn_with_scripted_player() {
    let mut engine = TurnEngine::new(
        Arc::new(scenario_config()),
        scenario_catalog(),
        &players(1),
        3,
    )
    .unwrap();
    let mut script = vec![
        build(CardCategory::UrbanBuilding, "Temple"),
        assign("Temple", 1),
        build(CardCategory::UrbanBuilding, "Temple"),
    ]
    .into_iter();

    let summary = engine.run_turn(|_, _| script.next()).unwrap();

    assert_eq!(summary.reports.len(), 4);
    assert_eq!(engine.state().turn(), 2);
    let snapshot = engine.snapshot(P0).unwrap();
    assert_eq!(snapshot.urban_buildings.len(), 1);
    assert_eq!(snapshot.urban_buildings[0].assigned_workers, 1);

    assert_eq!(summary.rejected.len(), 1);
    let rejection = &summary.rejected[0];
    assert_eq!(rejection.player, P0);
    assert_eq!(
        rejection.request,
        build(CardCategory::UrbanBuilding, "Temple")
    );
    assert!(matches!(&rejection.error, GameError::DuplicateCard(name) if name == "Temple"));
}

#[test]
fn test_run_turn_reports_every_repeat_of_an_illegal_request() {
    let mut engine = TurnEngine::new(
        Arc::new(GameConfig {
            max_requests_per_slot: 4,
            ..scenario_config()
        }),
        scenario_catalog(),
        &players(1),
        3,
    )
    .unwrap();

    let summary = engine
        .run_turn(|_, _| Some(build(CardCategory::Wonder, "Atlantis")))
        .unwrap();

    assert_eq!(summary.rejected.len(), 4);
    assert!(summary
        .rejected
        .iter()
        .all(|r| matches!(r.error, GameError::CardNotFound(_))));
    assert_eq!(engine.state().turn(), 2);
}

#[test]
fn test_exchange_cannot_create_resources() {
    let mut engine = scenario_engine(scenario_config());

    let snapshot = engine.submit(P0, &exchange("Market")).unwrap();
    assert_eq!(snapshot.resources.get(ResourceKind::Material), 3);
    assert_eq!(snapshot.resources.get(ResourceKind::Food), 1);
    assert_eq!(snapshot.civil_remaining, 2);

    let err = engine.submit(P0, &exchange("Windfall")).unwrap_err();
    assert!(matches!(err, GameError::InvalidRequest(_)));
    let snapshot = engine.snapshot(P0).unwrap();
    assert_eq!(snapshot.resources.get(ResourceKind::Culture), 0);
    assert_eq!(snapshot.civil_remaining, 2);

    // 3 material left: one more trade, then the rate can't be paid.
    engine.submit(P0, &exchange("Market")).unwrap();
    assert!(matches!(
        engine.submit(P0, &exchange("Market")),
        Err(GameError::InsufficientResources {
            resource: ResourceKind::Material,
            required: 2,
            available: 1
        })
    ));

    next_action_phase(&mut engine);
    assert!(!engine.state().is_terminal());
    assert_eq!(engine.state().players()[0].victory_points(), 0);
}

#[test]
fn test_food_upkeep_each_production_phase() {
    let mut engine = scenario_engine(GameConfig {
        starting_resources: ResourceMap::new().with(ResourceKind::Food, 5),
        food_upkeep: FoodUpkeep {
            free_population: 0,
            per_worker: 1,
        },
        max_turns: 5,
        ..scenario_config()
    });

    // Turn 1 production already ate 2 food for 2 workers.
    assert_eq!(
        engine.snapshot(P0).unwrap().resources.get(ResourceKind::Food),
        3
    );

    advance_to(&mut engine, Phase::Production);
    let report = engine.advance().unwrap();
    assert!(matches!(
        &report.events[0],
        EngineEvent::Produced { report, .. } if report.food_consumed == 2
    ));
    assert_eq!(
        engine.snapshot(P0).unwrap().resources.get(ResourceKind::Food),
        1
    );

    // Only 1 food left: upkeep stops at zero.
    next_action_phase(&mut engine);
    assert_eq!(
        engine.snapshot(P0).unwrap().resources.get(ResourceKind::Food),
        0
    );
    engine.state().check_invariants().unwrap();
}

#[test]
fn test_research_of_plain_card_is_rejected() {
    let mut engine = scenario_engine(scenario_config());

    let err = engine
        .submit(
            P0,
            &ActionRequest::Research {
                name: "Temple".to_string(),
            },
        )
        .unwrap_err();

    assert!(matches!(err, GameError::InvalidRequest(_)));
    let snapshot = engine.snapshot(P0).unwrap();
    assert!(snapshot.researched.is_empty());
    assert_eq!(snapshot.civil_remaining, 3);
}

#[test]
fn test_legal_actions_all_succeed() {
    let mut engine = base_engine(1, 9);
    advance_to(&mut engine, Phase::ActionPhase);

    let legal = engine.legal_actions(P0).unwrap();
    assert!(!legal.is_empty());
    for request in legal {
        let mut trial = engine.clone();
        assert!(trial.submit(P0, &request).is_ok(), "{request} should be legal");
    }
}

#[test]
fn test_snapshot_round_trips() {
    let mut engine = base_engine(2, 4);
    advance_to(&mut engine, Phase::ActionPhase);
    let snapshot = engine.snapshot(P0).unwrap();

    let json = serde_json::to_string(&snapshot).unwrap();
    let from_json: BoardSnapshot = serde_json::from_str(&json).unwrap();
    let bytes = bincode::serialize(&snapshot).unwrap();
    let from_bincode: BoardSnapshot = bincode::deserialize(&bytes).unwrap();

    assert_eq!(from_json, snapshot);
    assert_eq!(from_bincode, snapshot);
}

#[test]
fn test_saved_game_resumes_identically() {
    let mut engine = base_engine(2, 4);
    advance_to(&mut engine, Phase::ActionPhase);
    let bytes = engine.state().serialize().unwrap();

    let restored = GameState::deserialize(&bytes).unwrap();
    let resumed = TurnEngine::from_state(base_config(), base_catalog(), restored).unwrap();

    assert_eq!(resumed.state_hash(), engine.state_hash());
    assert_eq!(resumed.observation(), engine.observation());
}

#[test]
fn test_custom_corruption_policy() {
    let mut engine = scenario_engine(GameConfig {
        starting_resources: ResourceMap::new()
            .with(ResourceKind::Material, 5)
            .with(ResourceKind::Food, 1),
        ..scenario_config()
    });
    engine
        .submit(P0, &build(CardCategory::UrbanBuilding, "Temple"))
        .unwrap();
    advance_to(&mut engine, Phase::Production);

    let flat_tax = |_: BuildingCounts| 3_u32;
    let report = engine.advance_with_policy(&flat_tax).unwrap();

    let snapshot = engine.snapshot(P0).unwrap();
    assert_eq!(snapshot.resources.get(ResourceKind::Material), 2);
    assert_eq!(snapshot.resources.get(ResourceKind::Food), 1);
    assert!(matches!(
        &report.events[0],
        EngineEvent::Produced { report, .. } if report.corruption.total() == 3
    ));
}

#[test]
fn test_invalid_setup_is_fatal() {
    let missing_card = GameConfig {
        starting_cards: vec![StartingCard {
            name: "Atlantis".to_string(),
            workers: 0,
        }],
        ..scenario_config()
    };
    assert!(matches!(
        TurnEngine::new(Arc::new(missing_card), scenario_catalog(), &players(1), 0),
        Err(GameError::CardNotFound(_))
    ));

    assert!(matches!(
        TurnEngine::new(Arc::new(scenario_config()), scenario_catalog(), &[], 0),
        Err(GameError::InvalidConfig(_))
    ));
}

#[test]
fn test_shipped_data_loads() {
    let catalog = base_catalog();
    let config = base_config();

    assert_eq!(catalog.len(), 23);
    assert!(catalog.available_in(Age::I).count() < catalog.len());
    for starting in &config.starting_cards {
        assert!(catalog.contains(&starting.name), "{} missing", starting.name);
    }
    assert_eq!(config.victory_point_target, Some(120));
}
