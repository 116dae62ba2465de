use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::expense::Expense;
use super::money::Money;
use super::time_interval::MonthBucket;

/// The (category, month, year) grouping key for budget aggregation.
///
/// Keys are ordered by (year, month, category) so alert listings and
/// persisted snapshots come out in a stable calendar order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BudgetKey {
    pub category: String,
    pub month: u32,
    pub year: i32,
}

impl BudgetKey {
    pub fn new(category: impl Into<String>, month: u32, year: i32) -> Self {
        Self {
            category: category.into(),
            month,
            year,
        }
    }

    pub fn for_expense(expense: &Expense) -> Self {
        let bucket = expense.bucket();
        Self {
            category: expense.category.clone(),
            month: bucket.month,
            year: bucket.year,
        }
    }

    pub fn bucket(&self) -> MonthBucket {
        MonthBucket {
            month: self.month,
            year: self.year,
        }
    }
}

impl PartialOrd for BudgetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BudgetKey {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month, &self.category).cmp(&(other.year, other.month, &other.category))
    }
}

impl fmt::Display for BudgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{:02}", self.category, self.year, self.month)
    }
}

/// A spending guardrail for one bucket.
///
/// `spent` is derived state: it always equals the sum of matching expense
/// amounts and can be rebuilt from the expense set at any time. A zero
/// `limit` marks a bucket that accrued spend before any limit was set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetGoal {
    pub category: String,
    pub month: u32,
    pub year: i32,
    pub limit: Money,
    pub spent: Money,
}

impl BudgetGoal {
    pub fn key(&self) -> BudgetKey {
        BudgetKey {
            category: self.category.clone(),
            month: self.month,
            year: self.year,
        }
    }
}
