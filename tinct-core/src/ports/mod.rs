//! Seams the engine depends on. Adapters live in [`crate::store`] and
//! [`crate::bus`].

pub mod change_bus;
pub mod settings_store;

pub use change_bus::{ChangeBus, ChangeEvent, SettingChangeStream};
pub use settings_store::SettingsStore;
