//! Engine components: canonical store, recurrence generation, budget
//! aggregation, and the coordinating facade.

pub mod budget_ledger;
pub mod categorize;
pub mod recurrence;
pub mod store;
pub mod tracker;

pub use budget_ledger::BudgetLedger;
pub use categorize::{Categorizer, TitleCategorizer};
pub use recurrence::{generate_due_expenses, ExpenseSink, GenerationReport, SkippedTemplate};
pub use store::ExpenseStore;
pub use tracker::ExpenseTracker;
