//! Configuration loading for Tinct.
//!
//! Values come from compiled defaults, an optional `tinct.toml`, and the
//! environment (after an optional `.env`), in increasing precedence. The
//! loader resolves which store and change bus to run and checks the result
//! with [`validation::apply_guard_rails`].
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, DEFAULT_STORE_PATH, error::ConfigLoadError,
};
pub use models::sources::{EnvConfig, FileConfig};
pub use models::{
    BusConfig, BusKind, Config, ConfigMetadata, EngineSettings, ServerConfig, StoreConfig,
    StoreKind,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
