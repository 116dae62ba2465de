use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ExpenseError;
use crate::ledger::{BudgetGoal, Expense, RecurringTemplate};
use crate::utils::{app_data_dir, ensure_dir};

use super::{Result, StorageBackend};

const EXPENSES_FILE: &str = "expenses.json";
const TEMPLATES_FILE: &str = "templates.json";
const GOALS_FILE: &str = "budgets.json";
const TMP_SUFFIX: &str = "tmp";

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<T> {
    schema_version: u32,
    records: Vec<T>,
}

/// JSON file backend. One file per record kind, written atomically by
/// staging to a temporary file and renaming into place.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    /// Opens (and creates if needed) a storage root. `None` resolves to the
    /// application data directory.
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_kind<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>> {
        let path = self.root.join(file_name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        let snapshot: Snapshot<T> = serde_json::from_str(&data)?;
        if snapshot.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(ExpenseError::Storage(format!(
                "`{}` is schema v{}, newer than supported v{}",
                path.display(),
                snapshot.schema_version,
                CURRENT_SCHEMA_VERSION
            )));
        }
        Ok(snapshot.records)
    }

    fn write_kind<T: Serialize + Clone>(&self, file_name: &str, records: &[T]) -> Result<()> {
        let snapshot = Snapshot {
            schema_version: CURRENT_SCHEMA_VERSION,
            records: records.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        let path = self.root.join(file_name);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn load_expenses(&self) -> Result<Vec<Expense>> {
        self.read_kind(EXPENSES_FILE)
    }

    fn save_expenses(&self, records: &[Expense]) -> Result<()> {
        self.write_kind(EXPENSES_FILE, records)
    }

    fn load_templates(&self) -> Result<Vec<RecurringTemplate>> {
        self.read_kind(TEMPLATES_FILE)
    }

    fn save_templates(&self, records: &[RecurringTemplate]) -> Result<()> {
        self.write_kind(TEMPLATES_FILE, records)
    }

    fn load_goals(&self) -> Result<Vec<BudgetGoal>> {
        self.read_kind(GOALS_FILE)
    }

    fn save_goals(&self, records: &[BudgetGoal]) -> Result<()> {
        self.write_kind(GOALS_FILE, records)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ExpenseDraft, Money, RecurrencePattern};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).expect("json storage");
        (storage, temp)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_expense() -> Expense {
        let draft = ExpenseDraft::new("Coffee", Money::from_cents(450), date(2025, 3, 1), "Food");
        draft.validate().unwrap();
        Expense::from_draft(draft)
    }

    #[test]
    fn missing_files_load_as_empty() {
        let (storage, _guard) = storage_with_temp_dir();
        assert!(storage.load_expenses().unwrap().is_empty());
        assert!(storage.load_templates().unwrap().is_empty());
        assert!(storage.load_goals().unwrap().is_empty());
    }

    #[test]
    fn save_and_load_roundtrip_per_kind() {
        let (storage, _guard) = storage_with_temp_dir();
        let expense = sample_expense();
        storage.save_expenses(&[expense.clone()]).unwrap();

        let template = RecurringTemplate::new(
            "Rent",
            Money::from_cents(120_000),
            "Housing",
            date(2025, 1, 31),
            RecurrencePattern::monthly(1),
        )
        .with_anchor_day(31);
        storage.save_templates(&[template.clone()]).unwrap();

        let goal = BudgetGoal {
            category: "Food".into(),
            month: 3,
            year: 2025,
            limit: Money::from_cents(20_000),
            spent: Money::from_cents(450),
        };
        storage.save_goals(&[goal.clone()]).unwrap();

        assert_eq!(storage.load_expenses().unwrap(), vec![expense]);
        assert_eq!(storage.load_templates().unwrap(), vec![template]);
        assert_eq!(storage.load_goals().unwrap(), vec![goal]);
    }

    #[test]
    fn future_schema_versions_are_rejected() {
        let (storage, guard) = storage_with_temp_dir();
        let newer = format!(
            "{{\"schema_version\":{},\"records\":[]}}",
            CURRENT_SCHEMA_VERSION + 1
        );
        fs::write(guard.path().join(EXPENSES_FILE), newer).unwrap();
        let err = storage
            .load_expenses()
            .expect_err("future schema should fail");
        assert!(matches!(err, ExpenseError::Storage(_)));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let (storage, guard) = storage_with_temp_dir();
        storage.save_expenses(&[sample_expense()]).unwrap();
        let leftovers: Vec<_> = fs::read_dir(guard.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.ends_with(TMP_SUFFIX))
                    .unwrap_or(false)
            })
            .collect();
        assert!(leftovers.is_empty());
    }
}
