use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ExpenseError;

use super::expense::Expense;
use super::money::Money;
use super::time_interval::{PatternUnit, RecurrencePattern};

/// A recurring expense definition.
///
/// `last_generated` is the watermark: the most recent occurrence date already
/// materialized. Once set it never moves backwards, and it is only ever a
/// date that was actually emitted as an expense. The generation engine is the
/// sole writer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringTemplate {
    pub id: Uuid,
    pub title: String,
    pub amount: Money,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub pattern: RecurrencePattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_day: Option<u32>,
    #[serde(default)]
    pub last_generated: Option<NaiveDate>,
    pub active: bool,
}

impl RecurringTemplate {
    pub fn new(
        title: impl Into<String>,
        amount: Money,
        category: impl Into<String>,
        start_date: NaiveDate,
        pattern: RecurrencePattern,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            amount,
            category: category.into(),
            notes: None,
            start_date,
            end_date: None,
            pattern,
            anchor_day: None,
            last_generated: None,
            active: true,
        }
    }

    pub fn with_anchor_day(mut self, day: u32) -> Self {
        self.anchor_day = Some(day);
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), ExpenseError> {
        if self.title.trim().is_empty() {
            return Err(ExpenseError::Validation("template title is empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(ExpenseError::Validation("template category is empty".into()));
        }
        if !self.amount.is_positive() {
            return Err(ExpenseError::Validation(format!(
                "template amount must be positive, got {}",
                self.amount
            )));
        }
        self.pattern.validate()?;
        if let Some(day) = self.anchor_day {
            if !(1..=31).contains(&day) {
                return Err(ExpenseError::Validation(format!(
                    "anchor day {} is outside 1..=31",
                    day
                )));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ExpenseError::Validation(format!(
                    "end date {} precedes start date {}",
                    end, self.start_date
                )));
            }
        }
        Ok(())
    }

    /// The intended day-of-month carried through monthly and yearly steps.
    /// Daily and weekly series advance linearly and ignore the anchor.
    pub(crate) fn effective_anchor(&self) -> Option<u32> {
        match self.pattern.unit {
            PatternUnit::Month | PatternUnit::Year => {
                Some(self.anchor_day.unwrap_or_else(|| self.start_date.day()))
            }
            PatternUnit::Day | PatternUnit::Week => None,
        }
    }

    /// Whether `date` falls inside the series end bound.
    pub fn allows(&self, date: NaiveDate) -> bool {
        match self.end_date {
            Some(end) => date <= end,
            None => true,
        }
    }

    /// The next occurrence not yet materialized, honoring the stored
    /// watermark as-is. `None` once the series is inactive or past its end.
    pub fn next_due(&self) -> Option<NaiveDate> {
        if !self.active {
            return None;
        }
        let anchor = self.effective_anchor();
        let candidate = match self.last_generated {
            Some(watermark) => self.pattern.advance(watermark, anchor),
            None => self.start_date,
        };
        if self.allows(candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Materializes one occurrence dated `date` with the template's fields.
    pub(crate) fn instantiate(&self, date: NaiveDate) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            amount: self.amount,
            date,
            category: self.category.clone(),
            notes: self.notes.clone(),
            currency: None,
            origin_template_id: Some(self.id),
        }
    }

    /// Advances the watermark, never backwards.
    pub(crate) fn advance_watermark(&mut self, date: NaiveDate) {
        match self.last_generated {
            Some(current) if date < current => {
                tracing::warn!(
                    template = %self.id,
                    %current,
                    attempted = %date,
                    "refusing watermark regression"
                );
            }
            _ => self.last_generated = Some(date),
        }
    }
}
