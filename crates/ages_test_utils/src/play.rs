//! Seeded random self-play.
//!
//! A [`RandomPolicy`] picks uniformly among the engine's legal actions
//! using a ChaCha RNG seeded from the game seed, so a game played twice
//! from the same setup is identical move for move.

use ages_core::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform random choice over legal actions.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    /// Create a policy from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick a legal request for `player`, or `None` to end the slot.
    ///
    /// Ending the slot is one more option alongside the legal requests.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`].
    pub fn choose(&mut self, engine: &TurnEngine, player: PlayerId) -> Result<Option<ActionRequest>> {
        let mut legal = engine.legal_actions(player)?;
        if legal.is_empty() {
            return Ok(None);
        }
        let pick = self.rng.gen_range(0..=legal.len());
        if pick == legal.len() {
            return Ok(None);
        }
        Ok(Some(legal.swap_remove(pick)))
    }
}

/// An engine paired with the policy driving every seat.
#[derive(Debug, Clone)]
pub struct SelfPlayGame {
    /// The game.
    pub engine: TurnEngine,
    /// Shared policy for all players.
    pub policy: RandomPolicy,
}

impl SelfPlayGame {
    /// Wrap `engine`, seeding the policy from the game seed.
    #[must_use]
    pub fn new(engine: TurnEngine) -> Self {
        let policy = RandomPolicy::new(engine.state().seed());
        Self { engine, policy }
    }

    /// Play one full turn. Does nothing once the game is over.
    ///
    /// # Errors
    ///
    /// Engine errors other than rule rejections.
    pub fn play_turn(&mut self) -> Result<()> {
        if self.engine.state().is_terminal() {
            return Ok(());
        }
        self.engine.advance()?;
        self.engine.advance()?;

        let seats: Vec<PlayerId> = self
            .engine
            .state()
            .players()
            .iter()
            .map(PlayerBoard::id)
            .collect();
        let cap = self.engine.config().max_requests_per_slot;
        for player in seats {
            for _ in 0..cap {
                let Some(request) = self.policy.choose(&self.engine, player)? else {
                    break;
                };
                self.engine.submit(player, &request)?;
            }
            self.engine.end_player_turn(player)?;
        }

        self.engine.advance()?;
        self.engine.advance()?;
        Ok(())
    }

    /// Play until the game ends.
    ///
    /// # Errors
    ///
    /// See [`play_turn`](Self::play_turn).
    pub fn play_to_end(&mut self) -> Result<GameOutcome> {
        while !self.engine.state().is_terminal() {
            self.play_turn()?;
        }
        let outcome = self
            .engine
            .state()
            .outcome()
            .cloned()
            .ok_or_else(|| GameError::InvalidState("terminal game without outcome".to_string()))?;
        tracing::debug!(
            seed = self.engine.state().seed(),
            turn = outcome.turn,
            reason = ?outcome.reason,
            "Self-play game finished"
        );
        Ok(outcome)
    }

    /// Hash of the engine state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.engine.state_hash()
    }
}
