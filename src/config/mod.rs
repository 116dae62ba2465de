use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ExpenseError;
use crate::utils::{app_data_dir, ensure_dir};

const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Explicit tracker configuration. Values are passed into calls that need
/// them; nothing in the engine reads ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub currency: String,
    pub currency_symbol: String,
    pub fallback_category: String,
    pub alert_threshold: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            currency: "USD".into(),
            currency_symbol: "$".into(),
            fallback_category: "Uncategorized".into(),
            alert_threshold: 0.9,
        }
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ExpenseError> {
        Self::from_base(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ExpenseError> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self, ExpenseError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    /// Loads the stored configuration, falling back to defaults when no file
    /// exists yet.
    pub fn load(&self) -> Result<TrackerConfig, ExpenseError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(TrackerConfig::default())
        }
    }

    pub fn save(&self, config: &TrackerConfig) -> Result<(), ExpenseError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = self.path.with_extension(format!("json.{}", TMP_SUFFIX));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
