pub mod error;

use std::fs;
use std::path::PathBuf;

use tinct_core::DEFAULT_CHANNEL;
use tinct_core::DEFAULT_STORE_TIMEOUT;
use tinct_core::bus::inproc::DEFAULT_CAPACITY;
use tracing::debug;

use crate::models::sources::{EnvConfig, FileConfig};
use crate::models::{
    BusConfig, BusKind, Config, ConfigMetadata, EngineSettings, ServerConfig,
    StoreConfig, StoreKind,
};
use crate::util::{non_blank, parse_duration};
use crate::validation::{self, ConfigWarnings};

pub use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: &[&str] = &["tinct.toml", "config/tinct.toml"];
pub const DEFAULT_STORE_PATH: &str = "data/design_settings.json";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Replaces the process environment (and skips `.env` loading).
    pub env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file_loaded) = match &self.options.env {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let (file_config, config_path) = self.load_file_config(&env)?;

        let mut warnings = ConfigWarnings::default();
        if config_path.is_none() {
            warnings.push_with_hint(
                "No tinct.toml detected; falling back to environment variables",
                "Create tinct.toml or point TINCT_CONFIG at a configuration file",
            );
        }

        let config = compose_config(
            file_config.unwrap_or_default(),
            env,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        warnings.extend(validation::apply_guard_rails(&config)?);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path),
            None => dotenvy::dotenv().map(|_| ()),
        };
        match result {
            Ok(()) => Ok(true),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
            {
                Some(path) => path,
                None => return Ok((None, None)),
            },
        };

        debug!(path = %path.display(), "reading configuration file");

        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigLoadError::Io {
                path: path.clone(),
                source,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Merges file and environment values over the compiled defaults. The
/// environment wins over the file.
fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        server: file_server,
        store: file_store,
        bus: file_bus,
        engine: file_engine,
    } = file;

    let server = ServerConfig {
        host: non_blank(env.server_host)
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(3000),
    };

    let database_url = non_blank(env.database_url).or(non_blank(file_store.url));
    let store_kind = match env.store_kind {
        Some(raw) => Some(raw.parse::<StoreKind>().map_err(|value| {
            ConfigLoadError::UnknownKind {
                key: "TINCT_STORE",
                value,
            }
        })?),
        None => file_store.kind,
    }
    .unwrap_or(if database_url.is_some() {
        StoreKind::Postgres
    } else {
        StoreKind::File
    });

    let store = match store_kind {
        StoreKind::Postgres => StoreConfig::Postgres {
            url: database_url.ok_or(ConfigLoadError::MissingStoreUrl {
                kind: "postgres",
            })?,
        },
        StoreKind::File => StoreConfig::File {
            path: env
                .store_path
                .or(file_store.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
        },
        StoreKind::Memory => StoreConfig::Memory,
    };

    let redis_url = non_blank(env.redis_url).or(non_blank(file_bus.redis_url));
    let channel = non_blank(env.bus_channel)
        .or(file_bus.channel)
        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
    let bus_kind = match env.bus_kind {
        Some(raw) => Some(raw.parse::<BusKind>().map_err(|value| {
            ConfigLoadError::UnknownKind {
                key: "TINCT_BUS",
                value,
            }
        })?),
        None => file_bus.kind,
    }
    .unwrap_or(match (&store, &redis_url) {
        (StoreConfig::Postgres { .. }, _) => BusKind::Postgres,
        (_, Some(_)) => BusKind::Redis,
        _ => BusKind::InProc,
    });

    let bus = match bus_kind {
        BusKind::Postgres => BusConfig::Postgres { channel },
        BusKind::Redis => BusConfig::Redis {
            url: redis_url.ok_or(ConfigLoadError::MissingRedisUrl)?,
            channel,
        },
        BusKind::InProc => BusConfig::InProc,
        BusKind::None => BusConfig::None,
    };

    let store_timeout = match non_blank(env.store_timeout).or(file_engine.store_timeout) {
        Some(raw) => parse_duration(&raw).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                key: "TINCT_STORE_TIMEOUT",
                value: raw.clone(),
                source,
            }
        })?,
        None => DEFAULT_STORE_TIMEOUT,
    };

    let engine = EngineSettings {
        store_timeout,
        bus_capacity: env
            .bus_capacity
            .or(file_engine.bus_capacity)
            .unwrap_or(DEFAULT_CAPACITY),
    };

    Ok(Config {
        server,
        store,
        bus,
        engine,
        metadata,
    })
}
