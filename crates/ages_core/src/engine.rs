//! The turn engine: the authoritative state machine of a game.
//!
//! Each turn runs the same phases in the same order for every board, in
//! turn order:
//!
//! 1. **TurnStart** - reset every action budget
//! 2. **Production** - cards produce, then corruption is paid
//! 3. **ActionPhase** - players submit requests, one slot each
//! 4. **Upkeep** - corruption level and victory points are recomputed
//! 5. **TurnEnd** - age progression and end-of-game checks
//!
//! The engine holds no randomness and iterates only ordered collections,
//! so the same setup and the same requests always give the same state.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions::ActionAllowance;
use crate::board::{PlayerBoard, PlayerId, PlayerSetup, ProductionReport, RuleContext};
use crate::cards::{Age, CardCategory, Collection};
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::corruption::CorruptionPolicy;
use crate::error::{GameError, Result};
use crate::observation::{BoardSnapshot, Observation};
use crate::request::{ActionEffect, ActionRequest};

/// Turn phases. The engine stores the phase that runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Budgets reset.
    TurnStart,
    /// Cards produce.
    Production,
    /// Players act.
    ActionPhase,
    /// Scores recomputed.
    Upkeep,
    /// Age and end-of-game checks.
    TurnEnd,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// The configured number of turns was played.
    TurnLimit,
    /// A player reached the victory point target.
    VictoryPointTarget,
    /// The final age ran its configured number of turns.
    AgesExhausted,
}

/// A player's final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Standing {
    /// Player.
    pub player: PlayerId,
    /// Final victory points.
    pub victory_points: u32,
}

/// Final result of a game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Why the game ended.
    pub reason: EndReason,
    /// Last turn played.
    pub turn: u32,
    /// Standings, best first; ties keep turn order.
    pub standings: Vec<Standing>,
}

impl GameOutcome {
    /// Player in first place.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.standings.first().map(|standing| standing.player)
    }
}

/// Events generated while running a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A board's action budget was reset.
    ActionsReset {
        /// Player.
        player: PlayerId,
        /// Budget for the new turn.
        allowance: ActionAllowance,
    },
    /// A board produced.
    Produced {
        /// Player.
        player: PlayerId,
        /// Production and corruption.
        report: ProductionReport,
    },
    /// The action phase closed with players who never ended their slot.
    SlotsForfeited {
        /// Players whose slots were skipped.
        players: Vec<PlayerId>,
    },
    /// A board's score was recomputed.
    ScoreUpdated {
        /// Player.
        player: PlayerId,
        /// Victory points.
        victory_points: u32,
        /// Corruption level.
        corruption: u32,
    },
    /// The game moved into a new age.
    AgeAdvanced {
        /// Previous age.
        from: Age,
        /// New age.
        to: Age,
    },
    /// The game is over.
    GameEnded(GameOutcome),
}

/// A request [`TurnEngine::run_turn`] could not apply.
#[derive(Debug)]
pub struct Rejection {
    /// Player who asked.
    pub player: PlayerId,
    /// The request.
    pub request: ActionRequest,
    /// Why it was refused.
    pub error: GameError,
}

/// Everything that happened in one [`TurnEngine::run_turn`].
#[derive(Debug)]
pub struct TurnSummary {
    /// One report per phase, in order.
    pub reports: Vec<PhaseReport>,
    /// Refused requests, in submission order.
    pub rejected: Vec<Rejection>,
}

/// Events from one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    /// Turn the phase belonged to.
    pub turn: u32,
    /// Phase that ran.
    pub phase: Phase,
    /// What happened.
    pub events: Vec<EngineEvent>,
}

/// Complete, serializable state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    players: Vec<PlayerBoard>,
    turn: u32,
    age: Age,
    phase: Phase,
    active_slot: usize,
    terminal: bool,
    outcome: Option<GameOutcome>,
    seed: u64,
}

impl GameState {
    /// Boards in turn order.
    #[must_use]
    pub fn players(&self) -> &[PlayerBoard] {
        &self.players
    }

    /// Board of `player`.
    #[must_use]
    pub fn board(&self, player: PlayerId) -> Option<&PlayerBoard> {
        self.players.iter().find(|board| board.id() == player)
    }

    /// Current turn, starting at 1.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current age.
    #[must_use]
    pub const fn age(&self) -> Age {
        self.age
    }

    /// Next phase to run.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the game is over.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Final result, once terminal.
    #[must_use]
    pub const fn outcome(&self) -> Option<&GameOutcome> {
        self.outcome.as_ref()
    }

    /// Seed for bot behaviour. The engine itself never reads it.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Player holding the action slot, during the action phase.
    #[must_use]
    pub fn active_player(&self) -> Option<PlayerId> {
        if self.terminal || self.phase != Phase::ActionPhase {
            return None;
        }
        self.players.get(self.active_slot).map(PlayerBoard::id)
    }

    /// Calculate a hash of the current game state.
    ///
    /// Two games with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Verify the structural invariants of every board.
    ///
    /// # Errors
    ///
    /// A description of the first violation.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.turn == 0 {
            return Err("turn counter must start at 1".to_string());
        }
        self.players
            .iter()
            .try_for_each(PlayerBoard::check_invariants)
    }

    /// Serialize the game state for save/load or replay.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize game: {}", e)))
    }

    /// Deserialize game state from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize game: {}", e)))
    }

    fn index_of(&self, player: PlayerId) -> Result<usize> {
        self.players
            .iter()
            .position(|board| board.id() == player)
            .ok_or(GameError::UnknownPlayer(player))
    }
}

/// Drives a [`GameState`] through its phases.
///
/// Configuration and catalog are shared read-only; the state is owned.
/// Any phase boundary is a safe point to clone, serialize or drop a game.
#[derive(Debug, Clone)]
pub struct TurnEngine {
    state: GameState,
    config: Arc<GameConfig>,
    catalog: Arc<Catalog>,
}

impl TurnEngine {
    /// Create a game at turn 1, age I, phase TurnStart.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, there are no players, or a
    /// board cannot be set up.
    pub fn new(
        config: Arc<GameConfig>,
        catalog: Arc<Catalog>,
        players: &[PlayerSetup],
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;
        if players.is_empty() {
            return Err(GameError::InvalidConfig(
                "a game needs at least one player".to_string(),
            ));
        }

        let boards = players
            .iter()
            .zip(0u32..)
            .map(|(setup, id)| PlayerBoard::new(PlayerId::new(id), setup, &config, &catalog))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            players = boards.len(),
            seed,
            max_turns = config.max_turns,
            "Game created"
        );

        Ok(Self {
            state: GameState {
                players: boards,
                turn: 1,
                age: Age::I,
                phase: Phase::TurnStart,
                active_slot: 0,
                terminal: false,
                outcome: None,
                seed,
            },
            config,
            catalog,
        })
    }

    /// Resume a saved game.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the state is inconsistent.
    pub fn from_state(
        config: Arc<GameConfig>,
        catalog: Arc<Catalog>,
        state: GameState,
    ) -> Result<Self> {
        config.validate()?;
        state.check_invariants().map_err(GameError::InvalidState)?;
        Ok(Self {
            state,
            config,
            catalog,
        })
    }

    /// Current game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Consume the engine, keeping the state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    /// Game configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Card catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Hash of the current state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.state.state_hash()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.state.terminal {
            return Err(GameError::GameFinished(self.state.turn));
        }
        Ok(())
    }

    /// Run the next phase using the configured corruption rule.
    ///
    /// In the action phase this closes the phase, forfeiting the slots of
    /// players who have not ended their turn.
    ///
    /// # Errors
    ///
    /// [`GameError::GameFinished`] once terminal.
    pub fn advance(&mut self) -> Result<PhaseReport> {
        let config = Arc::clone(&self.config);
        self.advance_with_policy(&config.corruption)
    }

    /// Run the next phase with a caller-supplied corruption policy.
    ///
    /// # Errors
    ///
    /// [`GameError::GameFinished`] once terminal.
    pub fn advance_with_policy(&mut self, corruption: &dyn CorruptionPolicy) -> Result<PhaseReport> {
        self.ensure_running()?;
        let turn = self.state.turn;
        let phase = self.state.phase;

        let events = match phase {
            Phase::TurnStart => self.run_turn_start()?,
            Phase::Production => self.run_production(corruption)?,
            Phase::ActionPhase => self.close_action_phase(),
            Phase::Upkeep => self.run_upkeep(corruption),
            Phase::TurnEnd => self.run_turn_end(),
        };

        tracing::debug!(turn, phase = %phase, events = events.len(), "Phase complete");
        Ok(PhaseReport {
            turn,
            phase,
            events,
        })
    }

    fn run_turn_start(&mut self) -> Result<Vec<EngineEvent>> {
        let mut events = Vec::with_capacity(self.state.players.len());
        for board in &mut self.state.players {
            board.reset_actions(&self.config)?;
            events.push(EngineEvent::ActionsReset {
                player: board.id(),
                allowance: board.action_allowance(&self.config)?,
            });
        }
        self.state.phase = Phase::Production;
        Ok(events)
    }

    fn run_production(&mut self, corruption: &dyn CorruptionPolicy) -> Result<Vec<EngineEvent>> {
        let mut events = Vec::with_capacity(self.state.players.len());
        for board in &mut self.state.players {
            let report =
                board.run_production(&self.config.production, &self.config.food_upkeep, corruption)?;
            events.push(EngineEvent::Produced {
                player: board.id(),
                report,
            });
        }
        self.state.phase = Phase::ActionPhase;
        self.state.active_slot = 0;
        Ok(events)
    }

    fn close_action_phase(&mut self) -> Vec<EngineEvent> {
        let forfeited: Vec<PlayerId> = self
            .state
            .players
            .iter()
            .skip(self.state.active_slot)
            .map(PlayerBoard::id)
            .collect();
        self.state.active_slot = self.state.players.len();
        self.state.phase = Phase::Upkeep;

        if forfeited.is_empty() {
            Vec::new()
        } else {
            vec![EngineEvent::SlotsForfeited { players: forfeited }]
        }
    }

    fn run_upkeep(&mut self, corruption: &dyn CorruptionPolicy) -> Vec<EngineEvent> {
        let events = self
            .state
            .players
            .iter_mut()
            .map(|board| {
                board.refresh_score(corruption);
                EngineEvent::ScoreUpdated {
                    player: board.id(),
                    victory_points: board.victory_points(),
                    corruption: board.corruption(),
                }
            })
            .collect();
        self.state.phase = Phase::TurnEnd;
        events
    }

    fn run_turn_end(&mut self) -> Vec<EngineEvent> {
        let completed = self.state.turn;
        let mut events = Vec::new();

        let target_reached = self.config.victory_point_target.is_some_and(|target| {
            self.state
                .players
                .iter()
                .any(|board| board.victory_points() >= target)
        });
        let reason = if self.config.ages.exhausted_after(completed) {
            Some(EndReason::AgesExhausted)
        } else if target_reached {
            Some(EndReason::VictoryPointTarget)
        } else if completed >= self.config.max_turns {
            Some(EndReason::TurnLimit)
        } else {
            None
        };

        if let Some(reason) = reason {
            let outcome = self.final_outcome(reason);
            tracing::info!(
                turn = completed,
                reason = ?reason,
                winner = ?outcome.winner(),
                "Game finished"
            );
            self.state.terminal = true;
            self.state.outcome = Some(outcome.clone());
            events.push(EngineEvent::GameEnded(outcome));
            return events;
        }

        let next_age = self
            .config
            .ages
            .age_for_turn(completed + 1)
            .max(self.state.age);
        if next_age != self.state.age {
            tracing::info!(turn = completed + 1, age = %next_age, "Age advanced");
            events.push(EngineEvent::AgeAdvanced {
                from: self.state.age,
                to: next_age,
            });
            self.state.age = next_age;
        }

        self.state.turn = completed + 1;
        self.state.phase = Phase::TurnStart;
        self.state.active_slot = 0;

        #[cfg(debug_assertions)]
        {
            let hash = self.state.state_hash();
            tracing::debug!(turn = self.state.turn, state_hash = hash, "Game state hash");
        }

        events
    }

    fn final_outcome(&self, reason: EndReason) -> GameOutcome {
        let mut standings: Vec<Standing> = self
            .state
            .players
            .iter()
            .map(|board| Standing {
                player: board.id(),
                victory_points: board.victory_points(),
            })
            .collect();
        // Stable sort: ties keep turn order.
        standings.sort_by(|a, b| b.victory_points.cmp(&a.victory_points));
        GameOutcome {
            reason,
            turn: self.state.turn,
            standings,
        }
    }

    fn ensure_slot(&self, player: PlayerId) -> Result<usize> {
        self.ensure_running()?;
        if self.state.phase != Phase::ActionPhase {
            return Err(GameError::WrongPhase {
                expected: Phase::ActionPhase,
                actual: self.state.phase,
            });
        }
        let index = self.state.index_of(player)?;
        if index != self.state.active_slot {
            let active = self
                .state
                .players
                .get(self.state.active_slot)
                .map_or(player, PlayerBoard::id);
            return Err(GameError::NotPlayersTurn { player, active });
        }
        Ok(index)
    }

    /// Apply one request for the player holding the action slot.
    ///
    /// Rejected requests change nothing and consume no budget; the
    /// player may keep submitting.
    ///
    /// # Errors
    ///
    /// Phase and turn-order errors, or the rule the request broke.
    pub fn submit(&mut self, player: PlayerId, request: &ActionRequest) -> Result<BoardSnapshot> {
        let index = self.ensure_slot(player)?;
        let ctx = RuleContext {
            catalog: &self.catalog,
            config: &self.config,
            age: self.state.age,
        };
        let board = &mut self.state.players[index];

        match board.apply(request, &ctx) {
            Ok(()) => {
                tracing::debug!(player = %player, request = %request, "Request applied");
                Ok(board.snapshot())
            }
            Err(err) => {
                tracing::debug!(player = %player, request = %request, error = %err, "Request rejected");
                Err(err)
            }
        }
    }

    /// End `player`'s action slot. After the last slot the phase closes.
    ///
    /// # Errors
    ///
    /// Phase and turn-order errors.
    pub fn end_player_turn(&mut self, player: PlayerId) -> Result<()> {
        self.ensure_slot(player)?;
        self.state.active_slot += 1;
        if self.state.active_slot >= self.state.players.len() {
            self.state.phase = Phase::Upkeep;
        }
        Ok(())
    }

    /// Requests that `player` could submit right now and that would succeed.
    ///
    /// Candidates are worker moves of one, pass actions, configured
    /// exchanges, population growth, and research or building of every
    /// catalog card of the current age or earlier.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`].
    pub fn legal_actions(&self, player: PlayerId) -> Result<Vec<ActionRequest>> {
        let index = self.state.index_of(player)?;
        if self.ensure_slot(player).is_err() {
            return Ok(Vec::new());
        }
        let board = &self.state.players[index];
        let ctx = RuleContext {
            catalog: &self.catalog,
            config: &self.config,
            age: self.state.age,
        };

        let mut candidates = vec![ActionRequest::IncreasePopulation];
        for template in self.catalog.available_in(self.state.age) {
            let researched = board.cards().is_researched(&template.name);
            if !researched
                && (template.requires_research() || template.category == CardCategory::Technology)
            {
                candidates.push(ActionRequest::Research {
                    name: template.name.clone(),
                });
            }
            if Collection::for_category(template.category).is_some()
                && !board.cards().contains(&template.name)
            {
                candidates.push(ActionRequest::BuildCard {
                    category: template.category,
                    name: template.name.clone(),
                });
            }
        }
        for card in board.cards().cards() {
            candidates.push(ActionRequest::AssignWorker {
                card_name: card.name().to_string(),
                count: 1,
            });
            candidates.push(ActionRequest::UnassignWorker {
                card_name: card.name().to_string(),
                count: 1,
            });
        }
        let effects = std::iter::once(ActionEffect::Pass).chain(
            self.config
                .exchanges
                .keys()
                .map(|name| ActionEffect::Exchange { name: name.clone() }),
        );
        for effect in effects {
            candidates.push(ActionRequest::SpendCivilAction {
                effect: effect.clone(),
            });
            candidates.push(ActionRequest::SpendMilitaryAction { effect });
        }

        Ok(candidates
            .into_iter()
            .filter(|request| board.validate(request, &ctx).is_ok())
            .collect())
    }

    /// Play one full turn, asking `decide` for each player's requests.
    ///
    /// `decide` is called repeatedly for the player holding the slot until
    /// it returns `None` or the configured per-slot cap is hit. Rejected
    /// requests change nothing and are returned in
    /// [`TurnSummary::rejected`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] unless called at TurnStart, or
    /// [`GameError::GameFinished`].
    pub fn run_turn<F>(&mut self, mut decide: F) -> Result<TurnSummary>
    where
        F: FnMut(&Observation, PlayerId) -> Option<ActionRequest>,
    {
        self.ensure_running()?;
        if self.state.phase != Phase::TurnStart {
            return Err(GameError::WrongPhase {
                expected: Phase::TurnStart,
                actual: self.state.phase,
            });
        }

        let mut reports = vec![self.advance()?, self.advance()?];
        let mut rejected = Vec::new();

        let seats: Vec<PlayerId> = self.state.players.iter().map(PlayerBoard::id).collect();
        for player in seats {
            for _ in 0..self.config.max_requests_per_slot {
                let observation = self.observation();
                let Some(request) = decide(&observation, player) else {
                    break;
                };
                if let Err(error) = self.submit(player, &request) {
                    rejected.push(Rejection {
                        player,
                        request,
                        error,
                    });
                }
            }
            self.end_player_turn(player)?;
        }

        reports.push(self.advance()?);
        reports.push(self.advance()?);
        Ok(TurnSummary { reports, rejected })
    }

    /// Snapshot of one board.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`].
    pub fn snapshot(&self, player: PlayerId) -> Result<BoardSnapshot> {
        let index = self.state.index_of(player)?;
        Ok(self.state.players[index].snapshot())
    }

    /// Observation of the whole game.
    #[must_use]
    pub fn observation(&self) -> Observation {
        Observation {
            turn: self.state.turn,
            age: self.state.age,
            phase: self.state.phase,
            terminal: self.state.terminal,
            active_player: self.state.active_player(),
            players: self
                .state
                .players
                .iter()
                .map(PlayerBoard::snapshot)
                .collect(),
        }
    }
}
