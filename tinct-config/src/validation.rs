use thiserror::Error;
use tinct_core::DEFAULT_CHANNEL;
use url::Url;

use crate::models::{BusConfig, Config, StoreConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigGuardRailError {
    #[error("{field} is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
    #[error("{field} must use one of the {expected} schemes, got `{scheme}`")]
    UnsupportedScheme {
        field: &'static str,
        scheme: String,
        expected: &'static str,
    },
    #[error("the postgres change bus requires the postgres settings store")]
    PostgresBusWithoutPostgresStore,
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("bus channel must not be empty")]
    EmptyChannel,
    #[error(
        "the postgres change bus listens on `{expected}`, the channel the database trigger notifies; got `{channel}`"
    )]
    PostgresChannelMismatch {
        channel: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

const POSTGRES_SCHEMES: &[&str] = &["postgres", "postgresql"];
const REDIS_SCHEMES: &[&str] = &["redis", "rediss"];

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    match &config.store {
        StoreConfig::Postgres { url } => {
            check_url("DATABASE_URL", url, POSTGRES_SCHEMES, "postgres")?;
        }
        StoreConfig::File { path } => {
            if path.is_relative() {
                warnings.push_with_hint(
                    format!(
                        "settings file {} is relative to the working directory",
                        path.display()
                    ),
                    "Set TINCT_STORE_PATH to an absolute path for service deployments",
                );
            }
        }
        StoreConfig::Memory => {
            warnings.push_with_hint(
                "Using the in-memory settings store; edits are lost on restart",
                "Set TINCT_STORE=postgres or TINCT_STORE=file to persist settings",
            );
        }
    }

    match &config.bus {
        BusConfig::Postgres { channel } => {
            if !matches!(config.store, StoreConfig::Postgres { .. }) {
                return Err(ConfigGuardRailError::PostgresBusWithoutPostgresStore);
            }
            check_channel(channel)?;
            if channel != DEFAULT_CHANNEL {
                return Err(ConfigGuardRailError::PostgresChannelMismatch {
                    channel: channel.clone(),
                    expected: DEFAULT_CHANNEL,
                });
            }
        }
        BusConfig::Redis { url, channel } => {
            check_url("REDIS_URL", url, REDIS_SCHEMES, "redis")?;
            check_channel(channel)?;
        }
        BusConfig::InProc => {}
        BusConfig::None => {
            warnings.push(
                "Change bus disabled; other sessions will not see edits until they reload",
            );
        }
    }

    if config.engine.store_timeout.is_zero() {
        return Err(ConfigGuardRailError::ZeroValue {
            field: "TINCT_STORE_TIMEOUT",
        });
    }
    if config.engine.bus_capacity == 0 {
        return Err(ConfigGuardRailError::ZeroValue {
            field: "TINCT_BUS_CAPACITY",
        });
    }

    Ok(warnings)
}

fn check_url(
    field: &'static str,
    raw: &str,
    schemes: &[&str],
    expected: &'static str,
) -> Result<(), ConfigGuardRailError> {
    let url = Url::parse(raw).map_err(|err| ConfigGuardRailError::InvalidUrl {
        field,
        reason: err.to_string(),
    })?;
    if !schemes.contains(&url.scheme()) {
        return Err(ConfigGuardRailError::UnsupportedScheme {
            field,
            scheme: url.scheme().to_string(),
            expected,
        });
    }
    Ok(())
}

fn check_channel(channel: &str) -> Result<(), ConfigGuardRailError> {
    if channel.trim().is_empty() {
        return Err(ConfigGuardRailError::EmptyChannel);
    }
    Ok(())
}
