//! JSON snapshot persistence for one couple's mirrored dataset.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{Bill, BillPayment, Budget, BudgetHistory, Expense};
use crate::errors::CoreResult;

pub const DATASET_SCHEMA_VERSION: u8 = 1;

const SNAPSHOT_EXTENSION: &str = "json";

/// Serializable snapshot of every mirrored table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub history: Vec<BudgetHistory>,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub payments: Vec<BillPayment>,
    #[serde(default = "Dataset::schema_version_default")]
    pub schema_version: u8,
}

impl Dataset {
    pub fn schema_version_default() -> u8 {
        DATASET_SCHEMA_VERSION
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self {
            expenses: Vec::new(),
            budgets: Vec::new(),
            history: Vec::new(),
            bills: Vec::new(),
            payments: Vec::new(),
            schema_version: Self::schema_version_default(),
        }
    }
}

/// File-based snapshot store. Snapshots are keyed by a sanitized name under a
/// managed directory, one JSON document per couple.
#[derive(Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    /// Opens the default per-user data directory.
    pub fn new_default() -> CoreResult<Self> {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("couple_bucks"))
    }

    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{SNAPSHOT_EXTENSION}", canonical_name(name)))
    }

    pub fn save(&self, name: &str, dataset: &Dataset) -> CoreResult<PathBuf> {
        let path = self.snapshot_path(name);
        let json = serde_json::to_string_pretty(dataset)?;
        write_atomic(&path, &json)?;
        tracing::debug!(path = %path.display(), "dataset snapshot written");
        Ok(path)
    }

    pub fn load(&self, name: &str) -> CoreResult<Dataset> {
        let path = self.snapshot_path(name);
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn list_snapshots(&self) -> CoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "couple".into()
    } else {
        sanitized
    }
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn write_atomic(path: &Path, data: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Split;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();

        let mut dataset = Dataset::default();
        dataset.expenses.push(Expense::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(42.75),
            "utilities",
            Split::even(),
        ));

        store.save("Ana & Ben", &dataset).unwrap();
        let loaded = store.load("Ana & Ben").unwrap();
        assert_eq!(loaded.expenses.len(), 1);
        assert_eq!(loaded.expenses[0].amount, dec!(42.75));
        assert_eq!(loaded.schema_version, DATASET_SCHEMA_VERSION);
    }

    #[test]
    fn names_are_sanitized_and_listed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();
        store.save("Ana & Ben", &Dataset::default()).unwrap();

        assert_eq!(store.list_snapshots().unwrap(), vec!["ana___ben".to_string()]);
        assert!(store
            .snapshot_path("Ana & Ben")
            .to_string_lossy()
            .ends_with("ana___ben.json"));
    }

    #[test]
    fn load_missing_snapshot_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.load("nope"),
            Err(crate::errors::CoreError::Io(_))
        ));
    }
}
