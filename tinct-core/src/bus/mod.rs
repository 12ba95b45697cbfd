//! [`ChangeBus`](crate::ports::ChangeBus) adapters.

use async_trait::async_trait;
use tinct_model::SettingRecord;

use crate::error::Result;
use crate::ports::{ChangeBus, SettingChangeStream};

pub mod inproc;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "redis")]
pub mod redis;

pub use inproc::InProcChangeBus;
#[cfg(feature = "postgres")]
pub use postgres::PostgresChangeBus;
#[cfg(feature = "redis")]
pub use redis::RedisChangeBus;

/// Channel name shared by the Postgres trigger and the Redis adapter.
pub const DEFAULT_CHANNEL: &str = "design_settings_changes";

/// Bus for single-session deployments: publishes go nowhere and the
/// subscription never yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopChangeBus;

#[async_trait]
impl ChangeBus for NoopChangeBus {
    async fn publish(&self, _record: &SettingRecord) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&self) -> Result<SettingChangeStream> {
        Ok(Box::pin(futures::stream::pending()))
    }
}
