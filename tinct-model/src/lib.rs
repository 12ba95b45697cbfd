//! Core data model definitions shared across Tinct crates.
//!
//! Nothing in here performs I/O: the types describe settings, colors and the
//! visual tokens they drive, and the DTOs the HTTP boundary exchanges.
#![allow(missing_docs)]

pub mod api;
pub mod color;
pub mod error;
pub mod setting;
pub mod snapshot;
pub mod surface;

pub use api::{ApiResponse, SettingsView, UpdateSettingRequest};
pub use color::{GRADIENT_LIGHTEN, PRESET_COLORS, Rgb, normalize_hex};
pub use error::ModelError;
pub use setting::{COLOR_SETTINGS, EngineState, SettingName, SettingRecord};
pub use snapshot::SettingsSnapshot;
pub use surface::{Backdrop, SurfaceUpdate, VisualToken};
