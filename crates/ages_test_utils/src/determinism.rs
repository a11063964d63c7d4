//! Determinism testing utilities.
//!
//! Self-play training relies on games being exactly reproducible: the
//! same setup and seed must replay the same requests and reach the same
//! boards. These helpers play self-play games while recording a
//! [`TurnTrace`], then compare traces turn by turn.
//!
//! # Sources of divergence
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   The engine only iterates `BTreeMap`s and turn-ordered `Vec`s.
//!
//! - **System randomness**: The engine never draws random numbers. Bots
//!   use a ChaCha RNG seeded from the game seed.
//!
//! - **Floating-point math**: All amounts are integers.
//!
//! # Hashes
//!
//! [`GameState::state_hash`] covers the seed, so two games with
//! different seeds never hash equal. [`boards_hash`] covers the player
//! boards only and is the one to compare when asking whether play
//! itself differed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread;

use ages_core::prelude::*;

use crate::play::SelfPlayGame;

/// Hash of every player board, ignoring seed, turn and phase.
#[must_use]
pub fn boards_hash(engine: &TurnEngine) -> u64 {
    let mut hasher = DefaultHasher::new();
    engine.state().players().hash(&mut hasher);
    hasher.finish()
}

/// Hashes taken after each turn of one self-play game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnTrace {
    /// Game seed.
    pub seed: u64,
    /// [`GameState::state_hash`] after each turn.
    pub state_hashes: Vec<u64>,
    /// [`boards_hash`] after each turn.
    pub board_hashes: Vec<u64>,
}

impl TurnTrace {
    /// Play up to `turns` turns of `game`, hashing after each.
    ///
    /// Turns after the game ends are not recorded.
    ///
    /// # Errors
    ///
    /// Engine errors raised while playing.
    pub fn record(mut game: SelfPlayGame, turns: u32) -> Result<Self> {
        let mut trace = Self {
            seed: game.engine.state().seed(),
            state_hashes: Vec::new(),
            board_hashes: Vec::new(),
        };
        for _ in 0..turns {
            if game.engine.state().is_terminal() {
                break;
            }
            game.play_turn()?;
            trace.state_hashes.push(game.state_hash());
            trace.board_hashes.push(boards_hash(&game.engine));
        }
        Ok(trace)
    }

    /// First turn, counting from 1, after which the two traces differ.
    #[must_use]
    pub fn first_divergence(&self, other: &Self) -> Option<u32> {
        let differs_at = self
            .state_hashes
            .iter()
            .zip(&other.state_hashes)
            .position(|(a, b)| a != b)
            .or_else(|| {
                (self.state_hashes.len() != other.state_hashes.len())
                    .then_some(self.state_hashes.len().min(other.state_hashes.len()))
            })?;
        Some(u32::try_from(differs_at).unwrap_or(u32::MAX).saturating_add(1))
    }
}

/// Traces of the same setup played more than once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// One trace per run.
    pub traces: Vec<TurnTrace>,
}

impl ReplayReport {
    /// First run that strayed from run 0, with the turn it strayed on.
    #[must_use]
    pub fn first_divergence(&self) -> Option<(usize, u32)> {
        let (reference, rest) = self.traces.split_first()?;
        rest.iter()
            .enumerate()
            .find_map(|(i, trace)| reference.first_divergence(trace).map(|turn| (i + 1, turn)))
    }

    /// Whether every run matched run 0 turn for turn.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.first_divergence().is_none()
    }

    /// Assert that every run matched, naming the first divergence.
    ///
    /// # Panics
    ///
    /// Panics if any run diverged.
    pub fn assert_deterministic(&self) {
        if let Some((run, turn)) = self.first_divergence() {
            panic!(
                "Game is non-deterministic: run {run} of {} diverged after turn {turn}",
                self.traces.len()
            );
        }
    }
}

/// Play `runs` games from `setup` one after another.
///
/// # Errors
///
/// Engine errors raised while playing.
pub fn replay<F>(setup: F, runs: usize, turns: u32) -> Result<ReplayReport>
where
    F: Fn() -> SelfPlayGame,
{
    let traces = (0..runs)
        .map(|_| TurnTrace::record(setup(), turns))
        .collect::<Result<Vec<_>>>()?;
    Ok(ReplayReport { traces })
}

/// Play `games` games from `setup` at once on scoped threads.
///
/// Games share whatever the setup shares (typically one `Arc<Catalog>`),
/// which is the concurrent usage the engine supports.
///
/// # Panics
///
/// Panics if a game thread panics or the engine reports an error.
pub fn replay_in_parallel<F>(setup: F, games: usize, turns: u32) -> ReplayReport
where
    F: Fn() -> SelfPlayGame + Sync,
{
    let traces = thread::scope(|s| {
        let handles: Vec<_> = (0..games)
            .map(|_| s.spawn(|| TurnTrace::record(setup(), turns)))
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .expect("game thread panicked")
                    .expect("self-play turn failed")
            })
            .collect()
    });
    ReplayReport { traces }
}

/// Save a game after `turns` turns, load it, and check that the loaded
/// game plays its next turn exactly like the original.
///
/// # Errors
///
/// Engine errors raised while playing, saving or loading.
pub fn verify_save_load<F>(setup: F, turns: u32) -> Result<bool>
where
    F: Fn() -> SelfPlayGame,
{
    let mut original = setup();
    for _ in 0..turns {
        original.play_turn()?;
    }

    let bytes = original.engine.state().serialize()?;
    let restored = GameState::deserialize(&bytes)?;
    if &restored != original.engine.state() {
        return Ok(false);
    }

    let mut loaded = original.clone();
    loaded.engine = TurnEngine::from_state(
        Arc::new(original.engine.config().clone()),
        Arc::new(original.engine.catalog().clone()),
        restored,
    )?;

    original.play_turn()?;
    loaded.play_turn()?;
    Ok(loaded.state_hash() == original.state_hash())
}

/// Proptest strategies for request sequences.
///
/// These generate valid and invalid requests alike: the engine must
/// reject the invalid ones without changing state.
pub mod strategies {
    use ages_core::prelude::*;
    use proptest::prelude::*;

    use crate::fixtures::SCENARIO_CARDS;

    /// Generate a card category.
    pub fn arb_card_category() -> impl Strategy<Value = CardCategory> {
        prop_oneof![
            Just(CardCategory::ProductionBuilding),
            Just(CardCategory::UrbanBuilding),
            Just(CardCategory::Wonder),
            Just(CardCategory::Leader),
            Just(CardCategory::Technology),
        ]
    }

    /// Generate a card name: mostly scenario cards, sometimes unknown.
    pub fn arb_card_name() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => proptest::sample::select(SCENARIO_CARDS.to_vec()).prop_map(str::to_string),
            1 => Just("Atlantis".to_string()),
        ]
    }

    /// Generate a non-card action effect: a pass, the scenario "Market"
    /// exchange, or an exchange nobody configured.
    pub fn arb_action_effect() -> impl Strategy<Value = ActionEffect> {
        prop_oneof![
            Just(ActionEffect::Pass),
            proptest::sample::select(vec!["Market", "Bazaar"]).prop_map(|name| {
                ActionEffect::Exchange {
                    name: name.to_string(),
                }
            }),
        ]
    }

    /// Generate any action request.
    pub fn arb_action_request() -> impl Strategy<Value = ActionRequest> {
        prop_oneof![
            (arb_card_category(), arb_card_name())
                .prop_map(|(category, name)| ActionRequest::BuildCard { category, name }),
            (arb_card_name(), 0u32..4)
                .prop_map(|(card_name, count)| ActionRequest::AssignWorker { card_name, count }),
            (arb_card_name(), 0u32..4)
                .prop_map(|(card_name, count)| ActionRequest::UnassignWorker { card_name, count }),
            arb_action_effect().prop_map(|effect| ActionRequest::SpendCivilAction { effect }),
            arb_action_effect().prop_map(|effect| ActionRequest::SpendMilitaryAction { effect }),
            arb_card_name().prop_map(|name| ActionRequest::Research { name }),
            Just(ActionRequest::IncreasePopulation),
        ]
    }

    /// Generate a sequence of requests.
    pub fn arb_request_sequence(max_len: usize) -> impl Strategy<Value = Vec<ActionRequest>> {
        proptest::collection::vec(arb_action_request(), 0..max_len)
    }
}
