//! Worker pool: population and worker assignment bookkeeping.
//!
//! Workers are fungible counters. The pool tracks how many are busy
//! board-wide; each [`CardInstance`] tracks how many sit on it.

use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::error::{GameError, Result};

/// A player's population and how much of it is assigned to cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct WorkerPool {
    population: u32,
    assigned: u32,
}

impl WorkerPool {
    /// Create a pool with `population` idle workers.
    #[must_use]
    pub const fn new(population: u32) -> Self {
        Self {
            population,
            assigned: 0,
        }
    }

    /// Total population.
    #[must_use]
    pub const fn population(&self) -> u32 {
        self.population
    }

    /// Workers assigned to cards.
    #[must_use]
    pub const fn assigned(&self) -> u32 {
        self.assigned
    }

    /// Workers not assigned to any card.
    #[must_use]
    pub const fn idle(&self) -> u32 {
        self.population - self.assigned
    }

    /// Check that `count` more workers could go onto `card`.
    ///
    /// # Errors
    ///
    /// [`GameError::WorkerCapacity`] if the card would overflow,
    /// [`GameError::PopulationExceeded`] if the board has too few idle workers.
    pub fn check_assign(&self, card: &CardInstance, count: u32) -> Result<()> {
        ensure_positive(count)?;
        let max_workers = card.template().max_workers;
        if card.assigned_workers().saturating_add(count) > max_workers {
            return Err(GameError::WorkerCapacity {
                card: card.name().to_string(),
                max_workers,
                assigned: card.assigned_workers(),
                requested: count,
            });
        }
        if count > self.idle() {
            return Err(GameError::PopulationExceeded {
                population: self.population,
                assigned: self.assigned,
                requested: count,
            });
        }
        Ok(())
    }

    /// Move `count` idle workers onto `card`.
    ///
    /// # Errors
    ///
    /// See [`check_assign`](Self::check_assign). Nothing changes on error.
    pub fn assign(&mut self, card: &mut CardInstance, count: u32) -> Result<()> {
        self.check_assign(card, count)?;
        card.set_assigned_workers(card.assigned_workers() + count);
        self.assigned += count;
        Ok(())
    }

    /// Return `count` workers from `card` to the idle pool.
    ///
    /// # Errors
    ///
    /// [`GameError::WorkersNotAssigned`] if the card holds fewer than `count`.
    pub fn unassign(&mut self, card: &mut CardInstance, count: u32) -> Result<()> {
        ensure_positive(count)?;
        if count > card.assigned_workers() {
            return Err(GameError::WorkersNotAssigned {
                card: card.name().to_string(),
                assigned: card.assigned_workers(),
                requested: count,
            });
        }
        card.set_assigned_workers(card.assigned_workers() - count);
        self.assigned -= count;
        Ok(())
    }

    /// Add one worker to the population, up to `cap`.
    ///
    /// # Errors
    ///
    /// [`GameError::PopulationCapReached`] when already at `cap`.
    pub fn grow(&mut self, cap: u32) -> Result<()> {
        if self.population >= cap {
            return Err(GameError::PopulationCapReached { cap });
        }
        self.population += 1;
        Ok(())
    }
}

fn ensure_positive(count: u32) -> Result<()> {
    if count == 0 {
        return Err(GameError::InvalidRequest(
            "worker count must be positive".to_string(),
        ));
    }
    Ok(())
}
