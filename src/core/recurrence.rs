use chrono::NaiveDate;
use uuid::Uuid;

use crate::ledger::{Expense, RecurringTemplate};

use super::store::ExpenseStore;

// Backstop against runaway schedules (e.g. a daily template years behind).
const MAX_OCCURRENCES_PER_RUN: usize = 1024;

/// Receives occurrences as the engine materializes them.
pub trait ExpenseSink {
    fn accept(&mut self, expense: Expense);
}

impl ExpenseSink for ExpenseStore {
    fn accept(&mut self, expense: Expense) {
        self.insert_generated(expense);
    }
}

impl ExpenseSink for Vec<Expense> {
    fn accept(&mut self, expense: Expense) {
        self.push(expense);
    }
}

/// A template the engine refused to process, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedTemplate {
    pub template_id: Uuid,
    pub reason: String,
}

/// Outcome of one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub created: Vec<Expense>,
    pub skipped: Vec<SkippedTemplate>,
}

/// Materializes every occurrence due on or before `as_of` exactly once.
///
/// Per active template the cursor starts at the stored watermark, or one
/// interval before `start_date` so the first advance lands on the start
/// itself. Each advance that stays within `as_of` and the end bound emits one
/// expense; the watermark then moves to the last emitted date. Running twice
/// with the same `as_of` therefore creates nothing the second time.
///
/// A template with a malformed definition is skipped with a `Validation`
/// reason and no partial emission; the remaining templates still process.
pub fn generate_due_expenses(
    as_of: NaiveDate,
    templates: &mut [RecurringTemplate],
    sink: &mut dyn ExpenseSink,
) -> GenerationReport {
    let mut report = GenerationReport::default();

    for template in templates.iter_mut() {
        if !template.active {
            continue;
        }
        if let Err(err) = template.validate() {
            tracing::warn!(template = %template.id, %err, "skipping malformed template");
            report.skipped.push(SkippedTemplate {
                template_id: template.id,
                reason: err.to_string(),
            });
            continue;
        }

        let anchor = template.effective_anchor();
        let mut cursor = match template.last_generated {
            Some(watermark) => watermark,
            None => template.pattern.step_back(template.start_date, anchor),
        };
        let mut emitted = 0usize;
        let mut last_emitted: Option<NaiveDate> = None;

        loop {
            let candidate = template.pattern.advance(cursor, anchor);
            if candidate > as_of || !template.allows(candidate) {
                break;
            }
            let occurrence = template.instantiate(candidate);
            report.created.push(occurrence.clone());
            sink.accept(occurrence);
            last_emitted = Some(candidate);
            cursor = candidate;
            emitted += 1;
            if emitted >= MAX_OCCURRENCES_PER_RUN {
                tracing::warn!(
                    template = %template.id,
                    limit = MAX_OCCURRENCES_PER_RUN,
                    "occurrence cap reached, remainder deferred to the next run"
                );
                break;
            }
        }

        if let Some(last) = last_emitted {
            template.advance_watermark(last);
            tracing::info!(
                template = %template.id,
                occurrences = emitted,
                watermark = %last,
                "materialized due occurrences"
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Money, RecurrencePattern};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn monthly_subscription() -> RecurringTemplate {
        RecurringTemplate::new(
            "Streaming",
            Money::from_cents(999),
            "Subscriptions",
            date(2025, 1, 15),
            RecurrencePattern::monthly(1),
        )
    }

    #[test]
    fn first_run_emits_from_start_date_inclusive() {
        let mut templates = vec![monthly_subscription()];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2025, 4, 20), &mut templates, &mut sink);

        let dates: Vec<NaiveDate> = report.created.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 15),
                date(2025, 2, 15),
                date(2025, 3, 15),
                date(2025, 4, 15),
            ]
        );
        assert_eq!(sink.len(), 4);
        assert_eq!(templates[0].last_generated, Some(date(2025, 4, 15)));
    }

    #[test]
    fn second_run_with_same_as_of_is_a_no_op() {
        let mut templates = vec![monthly_subscription()];
        let mut sink: Vec<Expense> = Vec::new();
        generate_due_expenses(date(2025, 4, 20), &mut templates, &mut sink);
        let again = generate_due_expenses(date(2025, 4, 20), &mut templates, &mut sink);
        assert!(again.created.is_empty());
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn clamped_occurrences_spring_back_to_the_anchor() {
        let mut templates = vec![RecurringTemplate::new(
            "Rent",
            Money::from_cents(120_000),
            "Housing",
            date(2025, 1, 31),
            RecurrencePattern::monthly(1),
        )
        .with_anchor_day(31)];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2025, 4, 30), &mut templates, &mut sink);

        let dates: Vec<NaiveDate> = report.created.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30),
            ]
        );
    }

    #[test]
    fn inactive_templates_are_skipped_without_watermark_movement() {
        let mut template = monthly_subscription();
        template.active = false;
        let mut templates = vec![template];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2025, 4, 20), &mut templates, &mut sink);
        assert!(report.created.is_empty());
        assert_eq!(templates[0].last_generated, None);
    }

    #[test]
    fn future_start_emits_nothing() {
        let mut templates = vec![monthly_subscription()];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2024, 12, 31), &mut templates, &mut sink);
        assert!(report.created.is_empty());
        assert_eq!(templates[0].last_generated, None);
    }

    #[test]
    fn end_date_stops_generation_before_as_of() {
        let mut templates = vec![monthly_subscription().with_end_date(date(2025, 2, 28))];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2025, 6, 1), &mut templates, &mut sink);
        let dates: Vec<NaiveDate> = report.created.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 1, 15), date(2025, 2, 15)]);
        assert_eq!(templates[0].last_generated, Some(date(2025, 2, 15)));
    }

    #[test]
    fn malformed_template_is_skipped_but_others_proceed() {
        let mut broken = monthly_subscription();
        broken.pattern.every = 0;
        let broken_id = broken.id;
        let mut templates = vec![broken, monthly_subscription()];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2025, 2, 1), &mut templates, &mut sink);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].template_id, broken_id);
        assert_eq!(report.created.len(), 2);
        assert_eq!(templates[0].last_generated, None);
    }

    #[test]
    fn resume_from_watermark_only_emits_the_gap() {
        let mut templates = vec![monthly_subscription()];
        let mut sink: Vec<Expense> = Vec::new();
        generate_due_expenses(date(2025, 2, 20), &mut templates, &mut sink);
        assert_eq!(sink.len(), 2);

        let report = generate_due_expenses(date(2025, 4, 20), &mut templates, &mut sink);
        let dates: Vec<NaiveDate> = report.created.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2025, 3, 15), date(2025, 4, 15)]);
    }

    #[test]
    fn biweekly_template_advances_by_fourteen_days() {
        let mut templates = vec![RecurringTemplate::new(
            "Cleaning",
            Money::from_cents(5000),
            "Household",
            date(2025, 1, 6),
            RecurrencePattern::weekly(2),
        )];
        let mut sink: Vec<Expense> = Vec::new();
        let report = generate_due_expenses(date(2025, 2, 3), &mut templates, &mut sink);
        let dates: Vec<NaiveDate> = report.created.iter().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date(2025, 1, 6), date(2025, 1, 20), date(2025, 2, 3)]
        );
    }
}
