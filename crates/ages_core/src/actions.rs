//! Per-turn civil and military action budgets.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// The two kinds of action a player spends each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Civil actions: building, research, workers, growth.
    Civil,
    /// Military actions.
    Military,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Civil => f.write_str("civil"),
            Self::Military => f.write_str("military"),
        }
    }
}

/// Actions granted per turn.
///
/// # Example RON
///
/// ```ron
/// (civil: 4, military: 2)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ActionAllowance {
    /// Civil actions per turn.
    #[serde(default)]
    pub civil: u32,
    /// Military actions per turn.
    #[serde(default)]
    pub military: u32,
}

impl ActionAllowance {
    /// Create an allowance.
    #[must_use]
    pub const fn new(civil: u32, military: u32) -> Self {
        Self { civil, military }
    }

    /// Allowance of one kind.
    #[must_use]
    pub const fn of(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Civil => self.civil,
            ActionKind::Military => self.military,
        }
    }
}

impl std::ops::Add for ActionAllowance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            civil: self.civil.saturating_add(rhs.civil),
            military: self.military.saturating_add(rhs.military),
        }
    }
}

/// Budget and usage for the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ActionBudget {
    budget: ActionAllowance,
    used_civil: u32,
    used_military: u32,
}

impl ActionBudget {
    /// Create a fresh budget with nothing used.
    #[must_use]
    pub const fn new(budget: ActionAllowance) -> Self {
        Self {
            budget,
            used_civil: 0,
            used_military: 0,
        }
    }

    /// Start a new turn: install `budget` and clear usage.
    pub fn reset(&mut self, budget: ActionAllowance) {
        *self = Self::new(budget);
    }

    /// Budget of `kind` this turn.
    #[must_use]
    pub const fn budget(&self, kind: ActionKind) -> u32 {
        self.budget.of(kind)
    }

    /// Actions of `kind` used this turn.
    #[must_use]
    pub const fn used(&self, kind: ActionKind) -> u32 {
        match kind {
            ActionKind::Civil => self.used_civil,
            ActionKind::Military => self.used_military,
        }
    }

    /// Actions of `kind` still available.
    #[must_use]
    pub const fn remaining(&self, kind: ActionKind) -> u32 {
        self.budget(kind) - self.used(kind)
    }

    /// Check that one action of `kind` is available.
    ///
    /// # Errors
    ///
    /// [`GameError::ActionBudgetExceeded`] when the budget is spent.
    pub fn ensure_available(&self, kind: ActionKind) -> Result<()> {
        if self.remaining(kind) == 0 {
            return Err(GameError::ActionBudgetExceeded {
                kind,
                budget: self.budget(kind),
            });
        }
        Ok(())
    }

    /// Spend one action of `kind`.
    ///
    /// # Errors
    ///
    /// [`GameError::ActionBudgetExceeded`] when the budget is spent.
    pub fn consume(&mut self, kind: ActionKind) -> Result<()> {
        self.ensure_available(kind)?;
        match kind {
            ActionKind::Civil => self.used_civil += 1,
            ActionKind::Military => self.used_military += 1,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_until_exhausted() {
        let mut budget = ActionBudget::new(ActionAllowance::new(2, 1));

        budget.consume(ActionKind::Civil).unwrap();
        budget.consume(ActionKind::Civil).unwrap();

        assert!(matches!(
            budget.consume(ActionKind::Civil),
            Err(GameError::ActionBudgetExceeded {
                kind: ActionKind::Civil,
                budget: 2
            })
        ));
        assert_eq!(budget.used(ActionKind::Civil), 2);
        assert_eq!(budget.remaining(ActionKind::Military), 1);
    }

    #[test]
    fn test_reset_clears_usage() {
        let mut budget = ActionBudget::new(ActionAllowance::new(3, 2));
        budget.consume(ActionKind::Civil).unwrap();
        budget.consume(ActionKind::Military).unwrap();

        budget.reset(ActionAllowance::new(4, 2));

        assert_eq!(budget.used(ActionKind::Civil), 0);
        assert_eq!(budget.used(ActionKind::Military), 0);
        assert_eq!(budget.budget(ActionKind::Civil), 4);
    }

    #[test]
    fn test_zero_budget_rejects() {
        let budget = ActionBudget::new(ActionAllowance::new(0, 0));
        assert!(budget.ensure_available(ActionKind::Military).is_err());
    }

    #[test]
    fn test_allowance_addition() {
        let total = ActionAllowance::new(4, 2) + ActionAllowance::new(1, 0);
        assert_eq!(total, ActionAllowance::new(5, 2));
        assert_eq!(total.of(ActionKind::Military), 2);
    }
}
