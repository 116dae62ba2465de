use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ExpenseError;

use super::money::Money;
use super::time_interval::MonthBucket;

/// A single expense record.
///
/// `origin_template_id` is set only on machine-generated occurrences and
/// points back at the recurring template that emitted them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Expense {
    pub id: Uuid,
    pub title: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_template_id: Option<Uuid>,
}

impl Expense {
    pub(crate) fn from_draft(draft: ExpenseDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            amount: draft.amount,
            date: draft.date,
            category: draft.category,
            notes: draft.notes,
            currency: draft.currency,
            origin_template_id: None,
        }
    }

    pub fn bucket(&self) -> MonthBucket {
        MonthBucket::of(self.date)
    }
}

/// Caller-supplied expense fields, validated before any state change.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: String,
    pub notes: Option<String>,
    pub currency: Option<String>,
}

impl ExpenseDraft {
    pub fn new(
        title: impl Into<String>,
        amount: Money,
        date: NaiveDate,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            amount,
            date,
            category: category.into(),
            notes: None,
            currency: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn validate(&self) -> Result<(), ExpenseError> {
        if self.title.trim().is_empty() {
            return Err(ExpenseError::Validation("expense title is empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(ExpenseError::Validation("expense category is empty".into()));
        }
        if !self.amount.is_positive() {
            return Err(ExpenseError::Validation(format!(
                "expense amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn draft_validation_rejects_bad_fields() {
        let good = ExpenseDraft::new("Coffee", Money::from_cents(450), date(2025, 3, 1), "Food");
        assert!(good.validate().is_ok());

        let mut blank_title = good.clone();
        blank_title.title = "  ".into();
        assert!(blank_title.validate().is_err());

        let mut blank_category = good.clone();
        blank_category.category = String::new();
        assert!(blank_category.validate().is_err());

        let mut free = good;
        free.amount = Money::zero();
        assert!(free.validate().is_err());
    }

    #[test]
    fn serde_omits_unset_optionals() {
        let draft = ExpenseDraft::new("Rent", Money::from_cents(90_000), date(2025, 1, 1), "Housing");
        let expense = Expense::from_draft(draft);
        let json = serde_json::to_string(&expense).unwrap();
        assert!(!json.contains("notes"));
        assert!(!json.contains("origin_template_id"));
        let back: Expense = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expense);
    }
}
