//! # Ages Core
//!
//! Deterministic turn and resource resolution engine for a
//! civilization-building card game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (catalogs and configs arrive as in-memory RON text)
//! - No system randomness
//! - No floating-point math
//!
//! This separation enables:
//! - Self-play and training loops with trustworthy rewards
//! - Many games in parallel sharing one catalog
//! - Save/load at any phase boundary
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`resources`] - Resource pools and the per-player ledger
//! - [`workers`] - Population and worker assignment
//! - [`actions`] - Civil and military action budgets
//! - [`cards`] - Card templates, instances and the card manager
//! - [`catalog`] - The immutable card catalog
//! - [`corruption`] - Pluggable corruption policies
//! - [`board`] - Player boards and request routing
//! - [`engine`] - The turn state machine
//! - [`observation`] - Snapshots for bots and trainers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actions;
pub mod board;
pub mod cards;
pub mod catalog;
pub mod config;
pub mod corruption;
pub mod data;
pub mod engine;
pub mod error;
pub mod observation;
pub mod request;
pub mod resources;
pub mod workers;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actions::{ActionAllowance, ActionBudget, ActionKind};
    pub use crate::board::{PlayerBoard, PlayerId, PlayerSetup, ProductionReport, RuleContext};
    pub use crate::cards::{
        Age, BuildTerms, CardCategory, CardInstance, CardManager, CardTemplate, Collection,
    };
    pub use crate::catalog::{Catalog, CatalogError};
    pub use crate::config::{
        ActionCostTable, AgeSchedule, FoodUpkeep, GameConfig, Government, ProductionMode,
        ProductionPolicy, ResourceExchange, StartingCard,
    };
    pub use crate::corruption::{BuildingCounts, CorruptionPolicy, CorruptionRule};
    pub use crate::engine::{
        EndReason, EngineEvent, GameOutcome, GameState, Phase, PhaseReport, Rejection, Standing,
        TurnEngine, TurnSummary,
    };
    pub use crate::error::{GameError, Result};
    pub use crate::observation::{BoardSnapshot, CardSnapshot, Observation};
    pub use crate::request::{ActionEffect, ActionRequest};
    pub use crate::resources::{ResourceDelta, ResourceKind, ResourceLedger, ResourceMap};
    pub use crate::workers::WorkerPool;
}
