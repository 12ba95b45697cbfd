//! Builds the store, bus and engine a [`Config`] describes.

use std::sync::Arc;

use anyhow::Context;
use tinct_config::{BusConfig, Config, StoreConfig};
use tinct_core::bus::postgres::PostgresChangeBusConfig;
use tinct_core::{
    ChangeBus, EngineConfig, InMemorySettingsStore, InProcChangeBus, JsonFileSettingsStore,
    NoopChangeBus, PostgresChangeBus, PostgresSettingsStore, RedisChangeBus, SettingsEngine,
    SettingsStore, TokenSurface,
};
use tracing::{error, info, warn};

use super::app_state::AppState;

/// Wires the engine for `config` around a fresh [`TokenSurface`].
///
/// Only configuration mistakes fail here. Unreachable backends are logged
/// and the engine falls back the way it does at runtime: defaults for the
/// store, no remote changes for the bus.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let surface = Arc::new(TokenSurface::default());

    let (store, pg_store): (Arc<dyn SettingsStore>, Option<PostgresSettingsStore>) =
        match &config.store {
            StoreConfig::Postgres { url } => {
                let pg = PostgresSettingsStore::connect_lazy(url)
                    .context("failed to configure PostgreSQL settings store")?;
                if let Err(err) = pg.migrate().await {
                    error!(error = %err, "PostgreSQL settings store unavailable at startup");
                }
                info!("Using PostgreSQL settings store");
                (Arc::new(pg.clone()), Some(pg))
            }
            StoreConfig::File { path } => {
                info!(path = %path.display(), "Using JSON file settings store");
                (Arc::new(JsonFileSettingsStore::new(path.clone())), None)
            }
            StoreConfig::Memory => {
                info!("Using in-memory settings store");
                (Arc::new(InMemorySettingsStore::new()), None)
            }
        };

    let capacity = config.engine.bus_capacity;
    let bus: Arc<dyn ChangeBus> = match &config.bus {
        BusConfig::Postgres { channel } => {
            let pg = pg_store
                .context("postgres change bus requires the postgres settings store")?;
            info!(channel = %channel, "Using PostgreSQL LISTEN/NOTIFY change bus");
            Arc::new(PostgresChangeBus::with_config(
                pg.pool().clone(),
                PostgresChangeBusConfig {
                    channel: channel.clone(),
                    channel_capacity: capacity,
                    ..PostgresChangeBusConfig::default()
                },
            ))
        }
        BusConfig::Redis { url, channel } => {
            match RedisChangeBus::connect_with_channel(url, channel).await {
                Ok(bus) => {
                    info!(channel = %channel, "Using Redis pub/sub change bus");
                    Arc::new(bus.with_channel_capacity(capacity))
                }
                Err(err) => {
                    warn!(error = %err, "Redis unavailable; remote changes disabled");
                    Arc::new(NoopChangeBus)
                }
            }
        }
        BusConfig::InProc => {
            info!("Using in-process change bus");
            Arc::new(InProcChangeBus::new(capacity))
        }
        BusConfig::None => {
            info!("Change bus disabled");
            Arc::new(NoopChangeBus)
        }
    };

    let engine = Arc::new(SettingsEngine::new(
        store,
        bus,
        surface.clone(),
        EngineConfig {
            store_timeout: config.engine.store_timeout,
        },
    ));

    Ok(AppState::new(engine, surface))
}
