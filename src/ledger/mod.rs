//! Expense domain models, persistence-friendly types, and calendar helpers.

pub mod budget;
pub mod expense;
pub mod money;
pub mod template;
pub mod time_interval;

pub use budget::{BudgetGoal, BudgetKey};
pub use expense::{Expense, ExpenseDraft};
pub use money::Money;
pub use template::RecurringTemplate;
pub use time_interval::{
    days_between, days_in_month, is_leap_year, is_same_month, MonthBucket, PatternUnit,
    RecurrencePattern,
};
