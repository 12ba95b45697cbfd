use std::collections::BTreeMap;

use async_trait::async_trait;
use tinct_model::SettingRecord;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::ports::SettingsStore;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    records: RwLock<BTreeMap<String, String>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = SettingRecord>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|r| (r.setting_name, r.setting_value))
                    .collect(),
            ),
        }
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        self.records.read().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load_all(&self) -> Result<Vec<SettingRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|(name, value)| SettingRecord::new(name, value))
            .collect())
    }

    async fn load(&self, setting_name: &str) -> Result<Option<SettingRecord>> {
        Ok(self
            .get(setting_name)
            .await
            .map(|value| SettingRecord::new(setting_name, value)))
    }

    async fn upsert(&self, record: &SettingRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.setting_name.clone(), record.setting_value.clone());
        Ok(())
    }
}
