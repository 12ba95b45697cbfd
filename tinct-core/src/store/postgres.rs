use std::fmt;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tinct_model::SettingRecord;
use tracing::{debug, info};

use crate::error::{Result, ThemeError};
use crate::ports::SettingsStore;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, FromRow)]
struct SettingRow {
    setting_name: String,
    setting_value: String,
}

/// `design_settings` table, upserted by its unique `setting_name`.
#[derive(Clone)]
pub struct PostgresSettingsStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresSettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettingsStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the pool without opening a connection. Unreachable databases
    /// surface later as [`ThemeError::StoreUnavailable`] on load.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_lazy(database_url)
            .map_err(|e| {
                ThemeError::StoreUnavailable(format!("Invalid PostgreSQL URL: {e}"))
            })?;
        Ok(Self { pool })
    }

    /// Applies the bundled schema (table plus change trigger).
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.map_err(|e| {
            ThemeError::StoreUnavailable(format!("Failed to apply migrations: {e}"))
        })?;
        info!("design_settings schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SettingsStore for PostgresSettingsStore {
    async fn load_all(&self) -> Result<Vec<SettingRecord>> {
        let rows = sqlx::query_as::<_, SettingRow>(
            r#"
            SELECT setting_name, setting_value
            FROM design_settings
            ORDER BY setting_name
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            ThemeError::StoreUnavailable(format!("Failed to load design settings: {e}"))
        })?;

        debug!(count = rows.len(), "loaded design settings");

        Ok(rows
            .into_iter()
            .map(|row| SettingRecord::new(row.setting_name, row.setting_value))
            .collect())
    }

    async fn load(&self, setting_name: &str) -> Result<Option<SettingRecord>> {
        let row = sqlx::query_as::<_, SettingRow>(
            r#"
            SELECT setting_name, setting_value
            FROM design_settings
            WHERE setting_name = $1
            "#,
        )
        .bind(setting_name)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| {
            ThemeError::StoreUnavailable(format!("Failed to load {setting_name}: {e}"))
        })?;

        Ok(row.map(|row| SettingRecord::new(row.setting_name, row.setting_value)))
    }

    async fn upsert(&self, record: &SettingRecord) -> Result<()> {
        // The WHERE clause keeps a repeated write from firing the change
        // trigger a second time.
        sqlx::query(
            r#"
            INSERT INTO design_settings (setting_name, setting_value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (setting_name)
            DO UPDATE SET
                setting_value = EXCLUDED.setting_value,
                updated_at = NOW()
            WHERE design_settings.setting_value IS DISTINCT FROM EXCLUDED.setting_value
            "#,
        )
        .bind(&record.setting_name)
        .bind(&record.setting_value)
        .execute(self.pool())
        .await
        .map_err(|e| {
            ThemeError::PersistenceFailure(format!(
                "Failed to upsert {}: {e}",
                record.setting_name
            ))
        })?;

        Ok(())
    }
}
