use std::collections::BTreeMap;

use crate::errors::ExpenseError;
use crate::ledger::{BudgetGoal, BudgetKey, Expense, Money};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GoalState {
    limit: Money,
    spent: Money,
}

/// Per-bucket budget limits and incrementally maintained spend totals.
///
/// The spent total for every key always equals the sum of matching expense
/// amounts, provided the host feeds every expense mutation through the
/// `on_expense_*` hooks. `reconcile` verifies that invariant against a full
/// recomputation; `self_heal` restores it.
///
/// A bucket that receives spend before any limit is set is tracked with a
/// zero limit. Such buckets never report a utilization and never alert.
#[derive(Debug, Default)]
pub struct BudgetLedger {
    goals: BTreeMap<BudgetKey, GoalState>,
}

impl BudgetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the ledger from persisted goal records.
    pub fn from_records(records: Vec<BudgetGoal>) -> Self {
        let mut goals = BTreeMap::new();
        for record in records {
            goals.insert(
                record.key(),
                GoalState {
                    limit: record.limit,
                    spent: record.spent,
                },
            );
        }
        Self { goals }
    }

    pub fn to_records(&self) -> Vec<BudgetGoal> {
        self.goals
            .iter()
            .map(|(key, state)| BudgetGoal {
                category: key.category.clone(),
                month: key.month,
                year: key.year,
                limit: state.limit,
                spent: state.spent,
            })
            .collect()
    }

    /// Creates or overwrites the limit for a key. Spent totals are untouched.
    pub fn set_budget(
        &mut self,
        category: &str,
        limit: Money,
        month: u32,
        year: i32,
    ) -> Result<(), ExpenseError> {
        if category.trim().is_empty() {
            return Err(ExpenseError::Validation("budget category is empty".into()));
        }
        if !(1..=12).contains(&month) {
            return Err(ExpenseError::Validation(format!(
                "month {} is outside 1..=12",
                month
            )));
        }
        if !limit.is_positive() {
            return Err(ExpenseError::Validation(format!(
                "budget limit must be positive, got {}",
                limit
            )));
        }
        let key = BudgetKey::new(category, month, year);
        self.goals.entry(key).or_default().limit = limit;
        Ok(())
    }

    /// Explicitly removes a goal. When matching spend is still tracked the
    /// entry stays as a zero-limit bucket so the spent invariant holds.
    pub fn remove_budget(&mut self, category: &str, month: u32, year: i32) -> bool {
        let key = BudgetKey::new(category, month, year);
        match self.goals.get_mut(&key) {
            Some(state) if state.spent.is_zero() => {
                self.goals.remove(&key);
                true
            }
            Some(state) if !state.limit.is_zero() => {
                state.limit = Money::zero();
                true
            }
            _ => false,
        }
    }

    pub fn on_expense_created(&mut self, expense: &Expense) {
        self.apply_delta(BudgetKey::for_expense(expense), expense.amount);
    }

    /// An update that moves an expense across categories or month buckets is
    /// a delete from the old key plus a create into the new one.
    pub fn on_expense_updated(&mut self, old: &Expense, new: &Expense) {
        let old_key = BudgetKey::for_expense(old);
        let new_key = BudgetKey::for_expense(new);
        if old_key == new_key {
            self.apply_delta(old_key, new.amount - old.amount);
        } else {
            self.apply_delta(old_key, -old.amount);
            self.apply_delta(new_key, new.amount);
        }
    }

    pub fn on_expense_deleted(&mut self, expense: &Expense) {
        self.apply_delta(BudgetKey::for_expense(expense), -expense.amount);
    }

    fn apply_delta(&mut self, key: BudgetKey, delta: Money) {
        if delta.is_zero() {
            return;
        }
        let state = self.goals.entry(key.clone()).or_default();
        state.spent += delta;
        if state.spent.is_negative() {
            tracing::warn!(%key, spent = %state.spent, "spent total went negative");
        }
        if state.spent.is_zero() && state.limit.is_zero() {
            self.goals.remove(&key);
        }
    }

    pub fn limit(&self, category: &str, month: u32, year: i32) -> Option<Money> {
        self.goals
            .get(&BudgetKey::new(category, month, year))
            .map(|state| state.limit)
            .filter(|limit| limit.is_positive())
    }

    pub fn spent(&self, category: &str, month: u32, year: i32) -> Money {
        self.goals
            .get(&BudgetKey::new(category, month, year))
            .map(|state| state.spent)
            .unwrap_or_else(Money::zero)
    }

    /// Spent divided by limit, or `None` while no positive limit exists.
    pub fn utilization(&self, category: &str, month: u32, year: i32) -> Option<f64> {
        let state = self.goals.get(&BudgetKey::new(category, month, year))?;
        if !state.limit.is_positive() {
            return None;
        }
        Some(state.spent.cents() as f64 / state.limit.cents() as f64)
    }

    /// Keys whose utilization is at or above `threshold`, in calendar order.
    pub fn alerts_above(&self, threshold: f64) -> Vec<BudgetKey> {
        self.goals
            .iter()
            .filter(|(_, state)| {
                state.limit.is_positive()
                    && state.spent.cents() as f64 / state.limit.cents() as f64 >= threshold
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Verifies every spent total against a recomputation from `expenses`.
    /// Drift is reported, never fixed here.
    pub fn reconcile(&self, expenses: &[Expense]) -> Result<(), ExpenseError> {
        let expected = recompute(expenses);
        let mut drift = Vec::new();
        for (key, state) in &self.goals {
            let expected_spent = expected.get(key).copied().unwrap_or_else(Money::zero);
            if state.spent != expected_spent {
                drift.push(format!(
                    "{}: tracked {} expected {}",
                    key, state.spent, expected_spent
                ));
            }
        }
        for (key, expected_spent) in &expected {
            if !self.goals.contains_key(key) {
                drift.push(format!("{}: tracked 0.00 expected {}", key, expected_spent));
            }
        }
        if drift.is_empty() {
            Ok(())
        } else {
            Err(ExpenseError::Consistency(drift.join("; ")))
        }
    }

    /// Recomputes every bucket from scratch, overwrites drifted totals, and
    /// logs each correction. Returns the number of corrected keys.
    pub fn self_heal(&mut self, expenses: &[Expense]) -> usize {
        let expected = recompute(expenses);
        let mut corrections = 0usize;

        let tracked: Vec<BudgetKey> = self.goals.keys().cloned().collect();
        for key in tracked {
            let expected_spent = expected.get(&key).copied().unwrap_or_else(Money::zero);
            let mut empty = false;
            if let Some(state) = self.goals.get_mut(&key) {
                if state.spent != expected_spent {
                    tracing::warn!(%key, from = %state.spent, to = %expected_spent, "healed spent total");
                    state.spent = expected_spent;
                    corrections += 1;
                }
                empty = state.spent.is_zero() && state.limit.is_zero();
            }
            if empty {
                self.goals.remove(&key);
            }
        }
        for (key, expected_spent) in expected {
            if !self.goals.contains_key(&key) && !expected_spent.is_zero() {
                tracing::warn!(%key, to = %expected_spent, "healed missing bucket");
                self.goals.insert(
                    key,
                    GoalState {
                        limit: Money::zero(),
                        spent: expected_spent,
                    },
                );
                corrections += 1;
            }
        }
        corrections
    }
}

fn recompute(expenses: &[Expense]) -> BTreeMap<BudgetKey, Money> {
    let mut totals: BTreeMap<BudgetKey, Money> = BTreeMap::new();
    for expense in expenses {
        *totals
            .entry(BudgetKey::for_expense(expense))
            .or_insert_with(Money::zero) += expense.amount;
    }
    totals
}
