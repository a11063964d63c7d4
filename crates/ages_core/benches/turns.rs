//! Turn engine benchmarks.
//!
//! Run with: `cargo bench -p ages_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use ages_core::prelude::*;
use ages_test_utils::fixtures::{advance_to, base_engine};
use ages_test_utils::play::SelfPlayGame;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// One random self-play turn and a full four-player game.
pub fn self_play_benchmark(c: &mut Criterion) {
    c.bench_function("self_play_turn_4p", |b| {
        b.iter_batched(
            || SelfPlayGame::new(base_engine(4, 17)),
            |mut game| {
                game.play_turn().expect("turn failed");
                black_box(game.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("self_play_game_4p", |b| {
        b.iter_batched(
            || SelfPlayGame::new(base_engine(4, 17)),
            |mut game| black_box(game.play_to_end().expect("game failed")),
            BatchSize::SmallInput,
        );
    });
}

/// Enumerating legal actions, the hot path of any bot.
pub fn legal_actions_benchmark(c: &mut Criterion) {
    let mut engine = base_engine(2, 3);
    advance_to(&mut engine, Phase::ActionPhase);

    c.bench_function("legal_actions", |b| {
        b.iter(|| black_box(engine.legal_actions(PlayerId::new(0)).expect("seated")));
    });

    c.bench_function("observation_features", |b| {
        b.iter(|| black_box(engine.observation().feature_vector(PlayerId::new(0))));
    });
}

criterion_group!(benches, self_play_benchmark, legal_actions_benchmark);
criterion_main!(benches);
