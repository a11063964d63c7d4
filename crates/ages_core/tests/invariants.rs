//! Property tests: arbitrary request sequences never corrupt a board.

use ages_core::prelude::*;
use ages_test_utils::determinism::strategies::arb_request_sequence;
use ages_test_utils::fixtures::{base_engine, next_action_phase, scenario_config, scenario_engine};
use proptest::prelude::*;

const P0: PlayerId = PlayerId::new(0);

fn rich_config() -> GameConfig {
    GameConfig {
        starting_resources: ResourceMap::new()
            .with(ResourceKind::Material, 12)
            .with(ResourceKind::Science, 6)
            .with(ResourceKind::Food, 6),
        starting_population: 3,
        max_turns: 5,
        ..scenario_config()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_invariants_hold_after_every_request(requests in arb_request_sequence(24)) {
        let mut engine = scenario_engine(rich_config());

        for request in &requests {
            let before = engine.state_hash();
            let budget_before = *engine.state().players()[0].budget();

            match engine.submit(P0, request) {
                Ok(_) => {
                    let budget = engine.state().players()[0].budget();
                    let total_used =
                        budget.used(ActionKind::Civil) + budget.used(ActionKind::Military);
                    let before_used = budget_before.used(ActionKind::Civil)
                        + budget_before.used(ActionKind::Military);
                    prop_assert!(total_used - before_used <= 1);
                }
                Err(_) => prop_assert_eq!(engine.state_hash(), before),
            }
            prop_assert!(engine.state().check_invariants().is_ok());
            // Culture only comes from production; no request may mint it.
            prop_assert_eq!(
                engine.snapshot(P0).unwrap().resources.get(ResourceKind::Culture),
                0
            );
        }
    }

    #[test]
    fn test_invariants_hold_across_turns(
        turns in proptest::collection::vec(arb_request_sequence(8), 1..4)
    ) {
        let mut engine = scenario_engine(rich_config());

        for requests in &turns {
            for request in requests {
                let _ = engine.submit(P0, request);
            }
            let age_before = engine.state().age();
            next_action_phase(&mut engine);
            prop_assert!(engine.state().age() >= age_before);
            prop_assert!(engine.state().check_invariants().is_ok());

            let snapshot = engine.snapshot(P0).unwrap();
            prop_assert_eq!(snapshot.civil_remaining, snapshot.civil_budget);
            prop_assert_eq!(snapshot.military_remaining, snapshot.military_budget);
        }
    }

    #[test]
    fn test_validate_agrees_with_submit(requests in arb_request_sequence(16)) {
        let mut engine = scenario_engine(rich_config());

        for request in &requests {
            let legal = engine.legal_actions(P0).unwrap();
            let result = engine.submit(P0, request);
            if legal.contains(request) {
                prop_assert!(result.is_ok());
            }
        }
    }
}

#[test]
fn test_age_never_regresses_over_a_game() {
    let mut engine = base_engine(2, 21);
    let mut age = engine.state().age();

    while !engine.state().is_terminal() {
        engine.advance().unwrap();
        assert!(engine.state().age() >= age);
        age = engine.state().age();
    }

    assert_eq!(age, Age::III);
}
