//! Error types for the turn engine.
//!
//! Every gameplay error is local to the request that produced it: the
//! engine validates before mutating, so an `Err` always means "nothing
//! changed". Only catalog and configuration errors are fatal, and those
//! surface before a game exists.

use thiserror::Error;

use crate::actions::ActionKind;
use crate::board::PlayerId;
use crate::cards::{Age, CardCategory};
use crate::catalog::CatalogError;
use crate::engine::Phase;
use crate::resources::ResourceKind;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all engine errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Insufficient resources.
    #[error("Insufficient resources: need {required} {resource}, have {available}")]
    InsufficientResources {
        /// Resource type.
        resource: ResourceKind,
        /// Amount required.
        required: u64,
        /// Amount available.
        available: u64,
    },

    /// Assigning workers would exceed the card's worker capacity.
    #[error("Card '{card}' holds at most {max_workers} workers, {assigned} assigned, {requested} requested")]
    WorkerCapacity {
        /// Card name.
        card: String,
        /// Worker slots on the card.
        max_workers: u32,
        /// Workers currently on the card.
        assigned: u32,
        /// Workers requested.
        requested: u32,
    },

    /// Assigning workers would exceed the board's population.
    #[error("Population exceeded: {assigned} of {population} workers busy, {requested} requested")]
    PopulationExceeded {
        /// Total population.
        population: u32,
        /// Workers already assigned across the board.
        assigned: u32,
        /// Workers requested.
        requested: u32,
    },

    /// Removing more workers than a card holds.
    #[error("Card '{card}' has {assigned} workers, cannot remove {requested}")]
    WorkersNotAssigned {
        /// Card name.
        card: String,
        /// Workers currently on the card.
        assigned: u32,
        /// Workers requested.
        requested: u32,
    },

    /// Population is already at the configured cap.
    #[error("Population cap of {cap} reached")]
    PopulationCapReached {
        /// Configured cap.
        cap: u32,
    },

    /// No action of the requested kind remains this turn.
    #[error("No {kind} actions left ({budget} per turn)")]
    ActionBudgetExceeded {
        /// Action kind.
        kind: ActionKind,
        /// Budget for this turn.
        budget: u32,
    },

    /// The card's category does not belong in the target collection.
    #[error("Card '{card}' is a {actual} card, expected {expected}")]
    CardTypeMismatch {
        /// Card name.
        card: String,
        /// Category the target collection holds.
        expected: CardCategory,
        /// Category of the card.
        actual: CardCategory,
    },

    /// A card with this name is already on the board.
    #[error("Card '{0}' already exists on this board")]
    DuplicateCard(String),

    /// The card's build cost cannot be paid.
    #[error("Cannot afford '{card}': need {required} {resource}, have {available}")]
    UnaffordableCard {
        /// Card name.
        card: String,
        /// First resource that falls short.
        resource: ResourceKind,
        /// Amount required.
        required: u64,
        /// Amount available.
        available: u64,
    },

    /// The card must be researched before it can be built.
    #[error("Technology '{0}' has not been researched")]
    TechnologyNotResearched(String),

    /// The card has been researched already.
    #[error("Technology '{0}' is already researched")]
    AlreadyResearched(String),

    /// The card belongs to a later age.
    #[error("Card '{card}' belongs to age {card_age}, current age is {current}")]
    CardNotAvailable {
        /// Card name.
        card: String,
        /// Age of the card.
        card_age: Age,
        /// Current game age.
        current: Age,
    },

    /// No template with this name exists in the catalog.
    #[error("Card not found in catalog: {0}")]
    CardNotFound(String),

    /// The card exists in the catalog but not on this board.
    #[error("Player {player} has no card '{card}'")]
    CardNotOnBoard {
        /// Board owner.
        player: PlayerId,
        /// Card name.
        card: String,
    },

    /// The request is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No player with this id is seated.
    #[error("Unknown player: {0}")]
    UnknownPlayer(PlayerId),

    /// Another player holds the current action slot.
    #[error("Not player {player}'s turn, player {active} is acting")]
    NotPlayersTurn {
        /// Player that submitted.
        player: PlayerId,
        /// Player holding the slot.
        active: PlayerId,
    },

    /// The operation is only valid in another phase.
    #[error("Operation requires phase {expected:?}, engine is in {actual:?}")]
    WrongPhase {
        /// Phase the operation needs.
        expected: Phase,
        /// Current phase.
        actual: Phase,
    },

    /// The game is over and no further phases run.
    #[error("Game finished after turn {0}")]
    GameFinished(u32),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Card catalog could not be built.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
