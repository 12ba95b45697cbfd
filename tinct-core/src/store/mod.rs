//! [`SettingsStore`](crate::ports::SettingsStore) adapters.

pub mod json_file;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use json_file::JsonFileSettingsStore;
pub use memory::InMemorySettingsStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresSettingsStore;
