use chrono::NaiveDate;
use uuid::Uuid;

use crate::errors::ExpenseError;
use crate::ledger::{Expense, ExpenseDraft, MonthBucket};

/// Owns the canonical set of expense records.
///
/// Mutations validate before touching state, so a rejected call leaves the
/// store unchanged. Aggregate maintenance lives in `BudgetLedger`; callers
/// that keep a ledger must feed it every mutation returned from here.
#[derive(Debug, Default)]
pub struct ExpenseStore {
    expenses: Vec<Expense>,
}

impl ExpenseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted records.
    pub fn from_records(records: Vec<Expense>) -> Self {
        Self { expenses: records }
    }

    pub fn add(&mut self, draft: ExpenseDraft) -> Result<Expense, ExpenseError> {
        draft.validate()?;
        let expense = Expense::from_draft(draft);
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    /// Inserts an engine-generated occurrence. The template was validated at
    /// creation time, so the record is taken as-is.
    pub(crate) fn insert_generated(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    pub fn get(&self, id: Uuid) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    /// Replaces the caller-editable fields of an expense, returning the
    /// previous and the new record for aggregate maintenance.
    pub fn update(
        &mut self,
        id: Uuid,
        draft: ExpenseDraft,
    ) -> Result<(Expense, Expense), ExpenseError> {
        draft.validate()?;
        let slot = self
            .expenses
            .iter_mut()
            .find(|expense| expense.id == id)
            .ok_or_else(|| ExpenseError::Validation(format!("expense {} not found", id)))?;
        let old = slot.clone();
        slot.title = draft.title;
        slot.amount = draft.amount;
        slot.date = draft.date;
        slot.category = draft.category;
        slot.notes = draft.notes;
        slot.currency = draft.currency;
        Ok((old, slot.clone()))
    }

    /// Hard-deletes an expense, returning the removed record.
    pub fn remove(&mut self, id: Uuid) -> Result<Expense, ExpenseError> {
        let index = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or_else(|| ExpenseError::Validation(format!("expense {} not found", id)))?;
        Ok(self.expenses.remove(index))
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter()
    }

    pub fn records(&self) -> &[Expense] {
        &self.expenses
    }

    /// Expenses in one category falling inside a month bucket.
    pub fn in_month(&self, category: &str, bucket: MonthBucket) -> Vec<&Expense> {
        self.expenses
            .iter()
            .filter(|expense| expense.category == category && expense.bucket() == bucket)
            .collect()
    }

    /// Expenses dated within `[from, to]`, any category.
    pub fn in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Expense> {
        self.expenses
            .iter()
            .filter(|expense| expense.date >= from && expense.date <= to)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Money;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn draft(title: &str, cents: i64, when: NaiveDate, category: &str) -> ExpenseDraft {
        ExpenseDraft::new(title, Money::from_cents(cents), when, category)
    }

    #[test]
    fn add_assigns_id_and_stores_record() {
        let mut store = ExpenseStore::new();
        let expense = store
            .add(draft("Coffee", 450, date(2025, 3, 1), "Food"))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(expense.id).unwrap().title, "Coffee");
    }

    #[test]
    fn rejected_add_leaves_store_untouched() {
        let mut store = ExpenseStore::new();
        let err = store
            .add(draft("", 450, date(2025, 3, 1), "Food"))
            .expect_err("empty title must be rejected");
        assert!(matches!(err, ExpenseError::Validation(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn update_returns_old_and_new_and_keeps_identity() {
        let mut store = ExpenseStore::new();
        let expense = store
            .add(draft("Coffee", 450, date(2025, 3, 1), "Food"))
            .unwrap();
        let (old, new) = store
            .update(expense.id, draft("Espresso", 500, date(2025, 4, 2), "Treats"))
            .unwrap();
        assert_eq!(old.title, "Coffee");
        assert_eq!(new.title, "Espresso");
        assert_eq!(new.id, expense.id);
        assert_eq!(new.category, "Treats");
    }

    #[test]
    fn invalid_update_keeps_previous_record() {
        let mut store = ExpenseStore::new();
        let expense = store
            .add(draft("Coffee", 450, date(2025, 3, 1), "Food"))
            .unwrap();
        assert!(store
            .update(expense.id, draft("Coffee", 0, date(2025, 3, 1), "Food"))
            .is_err());
        assert_eq!(store.get(expense.id).unwrap().amount, Money::from_cents(450));
    }

    #[test]
    fn remove_returns_deleted_record() {
        let mut store = ExpenseStore::new();
        let expense = store
            .add(draft("Coffee", 450, date(2025, 3, 1), "Food"))
            .unwrap();
        let removed = store.remove(expense.id).unwrap();
        assert_eq!(removed.id, expense.id);
        assert!(store.is_empty());
        assert!(store.remove(expense.id).is_err());
    }

    #[test]
    fn month_and_range_queries_filter_correctly() {
        let mut store = ExpenseStore::new();
        store.add(draft("A", 100, date(2025, 4, 1), "Food")).unwrap();
        store.add(draft("B", 200, date(2025, 4, 30), "Food")).unwrap();
        store.add(draft("C", 300, date(2025, 5, 1), "Food")).unwrap();
        store.add(draft("D", 400, date(2025, 4, 15), "Rent")).unwrap();

        let bucket = MonthBucket { month: 4, year: 2025 };
        assert_eq!(store.in_month("Food", bucket).len(), 2);
        assert_eq!(store.in_range(date(2025, 4, 15), date(2025, 5, 1)).len(), 3);
    }
}
