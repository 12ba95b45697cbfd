use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{env_var, parse_env_var};

use super::{BusKind, StoreKind};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub store: FileStoreConfig,
    #[serde(default)]
    pub bus: FileBusConfig,
    #[serde(default)]
    pub engine: FileEngineConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<StoreKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileBusConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BusKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileEngineConfig {
    /// Human-readable duration such as `"5s"` or `"750ms"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_capacity: Option<usize>,
}

/// Environment-derived configuration values.
///
/// Values are kept raw where parsing can fail so the loader can report the
/// offending variable.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub store_kind: Option<String>,
    pub database_url: Option<String>,
    pub store_path: Option<PathBuf>,
    pub bus_kind: Option<String>,
    pub redis_url: Option<String>,
    pub bus_channel: Option<String>,
    pub store_timeout: Option<String>,
    pub bus_capacity: Option<usize>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: env_var("TINCT_CONFIG").map(PathBuf::from),
            server_host: env_var("SERVER_HOST"),
            server_port: parse_env_var("SERVER_PORT"),
            store_kind: env_var("TINCT_STORE"),
            database_url: env_var("DATABASE_URL"),
            store_path: env_var("TINCT_STORE_PATH").map(PathBuf::from),
            bus_kind: env_var("TINCT_BUS"),
            redis_url: env_var("REDIS_URL"),
            bus_channel: env_var("TINCT_BUS_CHANNEL"),
            store_timeout: env_var("TINCT_STORE_TIMEOUT"),
            bus_capacity: parse_env_var("TINCT_BUS_CAPACITY"),
        }
    }
}
