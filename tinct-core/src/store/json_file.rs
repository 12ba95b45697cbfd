use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tinct_model::SettingRecord;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, ThemeError};
use crate::ports::SettingsStore;

/// Settings kept in a local JSON document, one record per name.
///
/// Writes go through a sibling temp file and a rename, so a crash mid-write
/// leaves the previous document in place.
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "design_settings.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn read_document(&self) -> Result<BTreeMap<String, String>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let records: Vec<SettingRecord> = serde_json::from_str(&contents)?;
        Ok(records
            .into_iter()
            .map(|r| (r.setting_name, r.setting_value))
            .collect())
    }

    async fn write_document(&self, records: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let document: Vec<SettingRecord> = records
            .iter()
            .map(|(name, value)| SettingRecord::new(name, value))
            .collect();
        let json = serde_json::to_string_pretty(&document)?;

        let tmp = self.temp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn load_all(&self) -> Result<Vec<SettingRecord>> {
        let records = self.read_document().await.map_err(|e| {
            ThemeError::StoreUnavailable(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))
        })?;

        Ok(records
            .into_iter()
            .map(|(name, value)| SettingRecord::new(name, value))
            .collect())
    }

    async fn upsert(&self, record: &SettingRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        // An unreadable document is left alone rather than replaced with a
        // single record.
        let mut records = self.read_document().await.map_err(|e| {
            ThemeError::PersistenceFailure(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))
        })?;

        if records.get(&record.setting_name) == Some(&record.setting_value) {
            debug!(setting = %record.setting_name, "value unchanged; skipping file write");
            return Ok(());
        }

        records.insert(record.setting_name.clone(), record.setting_value.clone());
        self.write_document(&records).await.map_err(|e| {
            ThemeError::PersistenceFailure(format!(
                "failed to write {}: {e}",
                self.path.display()
            ))
        })
    }
}
