// ⚙️ Import Configuration
//
// Example `import.toml`:
//
//   source_path = "/tmp/test_import.xlsx"
//   database_path = "/root/ezbookkeeping-data/ezbookkeeping.db"
//   owner_uid = 3803138511473737728
//   timezone_offset_minutes = 180
//   transfer_categories = ["Конвертация валют", "Перевод между счетами"]

use crate::error::{ImportError, ImportResult};
use chrono::FixedOffset;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub source_path: PathBuf,
    pub database_path: PathBuf,

    /// Owner all lookups and inserts are scoped to
    pub owner_uid: i64,

    /// East of UTC is positive (Moscow = 180)
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset_minutes: i32,

    /// Server id embedded in generated identifiers
    #[serde(default)]
    pub server_id: u8,

    /// Category names whose rows are transfer legs
    #[serde(default)]
    pub transfer_categories: BTreeSet<String>,

    /// First source row is a header
    #[serde(default = "default_has_header")]
    pub has_header: bool,
}

fn default_timezone_offset() -> i32 {
    180
}

fn default_has_header() -> bool {
    true
}

impl ImportConfig {
    pub fn load(path: &Path) -> ImportResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ImportError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ImportResult<Self> {
        let config: ImportConfig =
            toml::from_str(text).map_err(|e| ImportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.owner_uid == 0 {
            return Err(ImportError::Config("owner_uid must be set".to_string()));
        }

        if self.timezone_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ImportError::Config(format!(
                "timezone_offset_minutes {} is outside ±{}",
                self.timezone_offset_minutes, MAX_OFFSET_MINUTES
            )));
        }

        if self.transfer_categories.is_empty() {
            warn!("No transfer categories configured; every row will import as income or expense");
        }

        Ok(())
    }

    pub fn timezone(&self) -> ImportResult<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_minutes * 60).ok_or_else(|| {
            ImportError::Config(format!(
                "invalid timezone offset: {} minutes",
                self.timezone_offset_minutes
            ))
        })
    }
}
