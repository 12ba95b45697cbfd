//! # Tinct Core
//!
//! Settings synchronization engine for Tinct: keeps one in-memory snapshot of
//! the design settings consistent with a durable store, propagates accepted
//! writes between sessions, and turns color settings into visual tokens.
//!
//! ## Feature Flags
//!
//! - `postgres`: PostgreSQL store and `LISTEN/NOTIFY` change bus (sqlx)
//! - `redis`: Redis pub/sub change bus
//!
//! ## Architecture
//!
//! - [`ports`]: the [`SettingsStore`](ports::SettingsStore) and
//!   [`ChangeBus`](ports::ChangeBus) seams
//! - [`store`] / [`bus`]: their adapters
//! - [`visual`]: [`VisualEffectApplier`](visual::VisualEffectApplier) and the
//!   [`RenderSurface`](visual::RenderSurface) it writes to
//! - [`engine`]: [`SettingsEngine`](engine::SettingsEngine), the single owner
//!   of the snapshot
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tinct_core::{
//!     EngineConfig, InMemorySettingsStore, NoopChangeBus, SettingsEngine, TokenSurface,
//! };
//!
//! # async fn run() -> tinct_core::Result<()> {
//! let surface = Arc::new(TokenSurface::default());
//! let engine = Arc::new(SettingsEngine::new(
//!     Arc::new(InMemorySettingsStore::new()),
//!     Arc::new(NoopChangeBus),
//!     surface.clone(),
//!     EngineConfig::default(),
//! ));
//!
//! engine.initialize().await;
//! engine.update_setting("accent_color", "F94555").await?;
//! assert_eq!(engine.snapshot().accent_color, "#F94555");
//! println!("{}", surface.stylesheet());
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

pub mod bus;
pub mod engine;
pub mod error;
pub mod ports;
pub mod store;
pub mod visual;

pub use bus::{DEFAULT_CHANNEL, InProcChangeBus, NoopChangeBus};
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub use bus::PostgresChangeBus;
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub use bus::RedisChangeBus;
pub use engine::{DEFAULT_STORE_TIMEOUT, EngineConfig, SettingsEngine};
pub use error::{Result, ThemeError};
pub use ports::{ChangeBus, ChangeEvent, SettingChangeStream, SettingsStore};
#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub use store::PostgresSettingsStore;
pub use store::{InMemorySettingsStore, JsonFileSettingsStore};
pub use visual::{RenderSurface, SurfaceFrame, TokenSurface, VisualEffectApplier};
