use async_trait::async_trait;
use tinct_model::SettingRecord;

use crate::error::Result;

/// Durable name → value persistence.
///
/// Each record is written independently: a failed upsert must leave every
/// previously stored record intact, and repeating an upsert with the same
/// record must leave the store as a single call would.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Every stored record, including names this build does not recognize.
    ///
    /// Transport or auth problems surface as
    /// [`ThemeError::StoreUnavailable`](crate::error::ThemeError::StoreUnavailable).
    async fn load_all(&self) -> Result<Vec<SettingRecord>>;

    /// The last accepted value for one name, if any.
    async fn load(&self, setting_name: &str) -> Result<Option<SettingRecord>> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|record| record.setting_name == setting_name))
    }

    /// Insert or replace the record keyed by `setting_name`.
    async fn upsert(&self, record: &SettingRecord) -> Result<()>;
}
