use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::errors::ExpenseError;
use crate::ledger::{
    BudgetKey, Expense, ExpenseDraft, Money, MonthBucket, RecurringTemplate,
};
use crate::storage::StorageBackend;

use super::budget_ledger::BudgetLedger;
use super::categorize::Categorizer;
use super::recurrence::{generate_due_expenses, ExpenseSink, GenerationReport};
use super::store::ExpenseStore;

/// Facade that wires the expense store, budget ledger, recurrence engine,
/// and persistence together.
///
/// Every expense mutation path routes through the matching ledger hook, so
/// no mutation can bypass aggregate maintenance. Designed for a single
/// writer; hosts sharing a tracker across threads must serialize mutating
/// calls externally.
pub struct ExpenseTracker {
    config: TrackerConfig,
    store: ExpenseStore,
    ledger: BudgetLedger,
    templates: Vec<RecurringTemplate>,
    categorizer: Option<Box<dyn Categorizer>>,
    storage: Box<dyn StorageBackend>,
}

struct LedgeredSink<'a> {
    store: &'a mut ExpenseStore,
    ledger: &'a mut BudgetLedger,
}

impl ExpenseSink for LedgeredSink<'_> {
    fn accept(&mut self, expense: Expense) {
        self.ledger.on_expense_created(&expense);
        self.store.accept(expense);
    }
}

impl ExpenseTracker {
    pub fn new(storage: Box<dyn StorageBackend>, config: TrackerConfig) -> Self {
        Self {
            config,
            store: ExpenseStore::new(),
            ledger: BudgetLedger::new(),
            templates: Vec::new(),
            categorizer: None,
            storage,
        }
    }

    pub fn with_categorizer(mut self, categorizer: Box<dyn Categorizer>) -> Self {
        self.categorizer = Some(categorizer);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Loads all record kinds from storage, replacing in-memory state.
    /// Returns integrity warnings; drift between the stored goals and the
    /// stored expenses is reported here, not silently fixed.
    pub fn load(&mut self) -> Result<Vec<String>, ExpenseError> {
        let expenses = self.storage.load_expenses()?;
        let templates = self.storage.load_templates()?;
        let goals = self.storage.load_goals()?;

        self.store = ExpenseStore::from_records(expenses);
        self.templates = templates;
        self.ledger = BudgetLedger::from_records(goals);

        let mut warnings = self.integrity_warnings();
        if let Err(err) = self.ledger.reconcile(self.store.records()) {
            warnings.push(err.to_string());
        }
        Ok(warnings)
    }

    /// Persists all record kinds. Save failures surface unmodified.
    pub fn save(&self) -> Result<(), ExpenseError> {
        self.storage.save_expenses(self.store.records())?;
        self.storage.save_templates(&self.templates)?;
        self.storage.save_goals(&self.ledger.to_records())?;
        Ok(())
    }

    /// Adds an expense. An empty category falls back to a categorizer
    /// suggestion, then to the configured fallback category.
    pub fn add_expense(&mut self, mut draft: ExpenseDraft) -> Result<Expense, ExpenseError> {
        if draft.category.trim().is_empty() {
            draft.category = self
                .categorizer
                .as_ref()
                .and_then(|c| c.suggest(&draft.title))
                .unwrap_or_else(|| self.config.fallback_category.clone());
        }
        let expense = self.store.add(draft)?;
        self.ledger.on_expense_created(&expense);
        if let Some(categorizer) = self.categorizer.as_mut() {
            categorizer.record(&expense.title, &expense.category);
        }
        Ok(expense)
    }

    pub fn update_expense(
        &mut self,
        id: Uuid,
        draft: ExpenseDraft,
    ) -> Result<Expense, ExpenseError> {
        let (old, new) = self.store.update(id, draft)?;
        self.ledger.on_expense_updated(&old, &new);
        Ok(new)
    }

    pub fn remove_expense(&mut self, id: Uuid) -> Result<Expense, ExpenseError> {
        let removed = self.store.remove(id)?;
        self.ledger.on_expense_deleted(&removed);
        Ok(removed)
    }

    pub fn expense(&self, id: Uuid) -> Option<&Expense> {
        self.store.get(id)
    }

    pub fn expenses(&self) -> &[Expense] {
        self.store.records()
    }

    pub fn expenses_in_month(&self, category: &str, bucket: MonthBucket) -> Vec<&Expense> {
        self.store.in_month(category, bucket)
    }

    pub fn expenses_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Expense> {
        self.store.in_range(from, to)
    }

    /// Registers a recurring template. Non-positive amounts and malformed
    /// patterns are rejected here, at creation time.
    pub fn add_template(&mut self, template: RecurringTemplate) -> Result<Uuid, ExpenseError> {
        template.validate()?;
        let id = template.id;
        self.templates.push(template);
        Ok(id)
    }

    pub fn template(&self, id: Uuid) -> Option<&RecurringTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    pub fn templates(&self) -> &[RecurringTemplate] {
        &self.templates
    }

    /// Edits a template via the provided mutator. The watermark is engine
    /// owned: whatever the mutator does to it is discarded, and already
    /// generated expenses are never touched retroactively.
    pub fn update_template<F>(&mut self, id: Uuid, mutator: F) -> Result<(), ExpenseError>
    where
        F: FnOnce(&mut RecurringTemplate),
    {
        let slot = self
            .templates
            .iter_mut()
            .find(|template| template.id == id)
            .ok_or_else(|| ExpenseError::Validation(format!("template {} not found", id)))?;
        let mut edited = slot.clone();
        mutator(&mut edited);
        edited.id = slot.id;
        edited.last_generated = slot.last_generated;
        edited.validate()?;
        *slot = edited;
        Ok(())
    }

    /// Deletes a template. Expenses it generated remain untouched.
    pub fn remove_template(&mut self, id: Uuid) -> Result<RecurringTemplate, ExpenseError> {
        let index = self
            .templates
            .iter()
            .position(|template| template.id == id)
            .ok_or_else(|| ExpenseError::Validation(format!("template {} not found", id)))?;
        Ok(self.templates.remove(index))
    }

    /// Runs the recurrence engine, feeding every new occurrence through the
    /// budget ledger hooks. Hosts call this at startup and on a schedule.
    pub fn run_generation(&mut self, as_of: NaiveDate) -> GenerationReport {
        let mut sink = LedgeredSink {
            store: &mut self.store,
            ledger: &mut self.ledger,
        };
        generate_due_expenses(as_of, &mut self.templates, &mut sink)
    }

    pub fn set_budget(
        &mut self,
        category: &str,
        limit: Money,
        month: u32,
        year: i32,
    ) -> Result<(), ExpenseError> {
        self.ledger.set_budget(category, limit, month, year)
    }

    pub fn remove_budget(&mut self, category: &str, month: u32, year: i32) -> bool {
        self.ledger.remove_budget(category, month, year)
    }

    pub fn utilization(&self, category: &str, month: u32, year: i32) -> Option<f64> {
        self.ledger.utilization(category, month, year)
    }

    pub fn spent(&self, category: &str, month: u32, year: i32) -> Money {
        self.ledger.spent(category, month, year)
    }

    pub fn alerts_above(&self, threshold: f64) -> Vec<BudgetKey> {
        self.ledger.alerts_above(threshold)
    }

    /// Alerts at the configured threshold.
    pub fn alerts(&self) -> Vec<BudgetKey> {
        self.ledger.alerts_above(self.config.alert_threshold)
    }

    pub fn reconcile(&self) -> Result<(), ExpenseError> {
        self.ledger.reconcile(self.store.records())
    }

    pub fn self_heal(&mut self) -> usize {
        self.ledger.self_heal(self.store.records())
    }

    pub fn suggest_category(&self, title: &str) -> Option<String> {
        self.categorizer.as_ref().and_then(|c| c.suggest(title))
    }

    /// Renders an amount with the configured currency symbol. Display only;
    /// sums and deltas always stay in minor units.
    pub fn format_amount(&self, amount: Money) -> String {
        amount.format_with_symbol(&self.config.currency_symbol)
    }

    fn integrity_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for expense in self.store.iter() {
            if let Some(origin) = expense.origin_template_id {
                match self.template(origin) {
                    None => warnings.push(format!(
                        "expense {} references unknown template {}",
                        expense.id, origin
                    )),
                    Some(template) => {
                        let behind = template
                            .last_generated
                            .map_or(true, |watermark| expense.date > watermark);
                        if behind {
                            warnings.push(format!(
                                "template {} watermark behind generated expense {}",
                                origin, expense.id
                            ));
                        }
                    }
                }
            }
        }
        for template in &self.templates {
            if let Err(err) = template.validate() {
                warnings.push(format!("template {} is malformed: {}", template.id, err));
            }
        }
        warnings
    }
}
