use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnSpec;
use crate::error::{MonthbookError, Result};
use crate::rules::RuleColumns;

pub const DB_FILE: &str = "monthbook.db";
pub const RULES_FILE: &str = "rules.csv";
pub const VIEW_FILE: &str = "view.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    /// Rule source; `<data_dir>/rules.csv` when unset.
    #[serde(default)]
    pub rules_path: Option<String>,
    #[serde(default)]
    pub columns: ColumnSpec,
    #[serde(default)]
    pub rule_columns: RuleColumns,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            rules_path: None,
            columns: ColumnSpec::default(),
            rule_columns: RuleColumns::default(),
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_path().join(DB_FILE)
    }

    pub fn view_path(&self) -> PathBuf {
        self.data_path().join(VIEW_FILE)
    }

    pub fn rules_path(&self) -> PathBuf {
        match &self.rules_path {
            Some(p) => PathBuf::from(p),
            None => self.data_path().join(RULES_FILE),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("monthbook")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("monthbook")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable {}: {e}", path.display());
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| MonthbookError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
