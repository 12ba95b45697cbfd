//! The settings engine: one in-memory snapshot kept in step with the store,
//! the change bus and the render surface.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;

use futures::StreamExt;
use tinct_model::{
    EngineState, Rgb, SettingName, SettingRecord, SettingsSnapshot, normalize_hex,
};
use tokio::sync::{Mutex as AsyncMutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::{Result, ThemeError};
use crate::ports::{ChangeBus, ChangeEvent, SettingChangeStream, SettingsStore};
use crate::visual::{RenderSurface, VisualEffectApplier};

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound for every store and bus round-trip.
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Owns the settings snapshot for the lifetime of the application.
///
/// The engine starts `Uninitialized`; [`SettingsEngine::initialize`] loads
/// the store once and moves it to `Ready`, after which local writes go
/// through [`SettingsEngine::update_setting`] and remote ones through
/// [`SettingsEngine::apply_remote_change`]. Both entry points hold the same
/// write lock, so the snapshot has a single writer at a time.
///
/// The store decides what a setting converges to: bus deliveries only say
/// which name to re-read, so a late or reordered notification cannot roll a
/// session back to an older value.
pub struct SettingsEngine {
    store: Arc<dyn SettingsStore>,
    bus: Arc<dyn ChangeBus>,
    applier: VisualEffectApplier,
    config: EngineConfig,
    snapshot: RwLock<SettingsSnapshot>,
    state: watch::Sender<EngineState>,
    changes: broadcast::Sender<SettingRecord>,
    writes: AsyncMutex<()>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SettingsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsEngine")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SettingsEngine {
    pub fn new(
        store: Arc<dyn SettingsStore>,
        bus: Arc<dyn ChangeBus>,
        surface: Arc<dyn RenderSurface>,
        config: EngineConfig,
    ) -> Self {
        let (state, _) = watch::channel(EngineState::Uninitialized);
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            store,
            bus,
            applier: VisualEffectApplier::new(surface),
            config,
            snapshot: RwLock::new(SettingsSnapshot::default()),
            state,
            changes,
            writes: AsyncMutex::new(()),
            listener: Mutex::new(None),
        }
    }

    /// Loads the store and enters `Ready`. Runs once; later calls return
    /// immediately.
    ///
    /// A failing or empty store leaves the defaults in place. The change bus
    /// is subscribed before the load so nothing accepted in between is lost;
    /// its backlog is drained once the engine is ready.
    pub async fn initialize(self: &Arc<Self>) {
        let entered = self.state.send_if_modified(|state| {
            if *state == EngineState::Uninitialized {
                *state = EngineState::Loading;
                true
            } else {
                false
            }
        });
        if !entered {
            debug!("settings engine already initialized");
            return;
        }

        info!("Loading design settings");

        let changes = match timeout(self.config.store_timeout, self.bus.subscribe()).await {
            Ok(Ok(stream)) => Some(stream),
            Ok(Err(err)) => {
                warn!(error = %err, "remote changes disabled; change bus unavailable");
                None
            }
            Err(_) => {
                warn!(
                    timeout = ?self.config.store_timeout,
                    "remote changes disabled; change bus subscribe timed out"
                );
                None
            }
        };

        let mut snapshot = SettingsSnapshot::default();
        match self.load_records().await {
            Ok(records) => {
                let merged = merge_records(&mut snapshot, &records);
                info!(
                    stored = records.len(),
                    applied = merged,
                    "design settings loaded"
                );
            }
            Err(err) => {
                warn!(error = %err, "using default design settings");
            }
        }

        {
            let _guard = self.writes.lock().await;
            self.applier.apply_all(&snapshot);
            *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
            self.state.send_replace(EngineState::Ready);
        }

        info!("Settings engine ready");

        if let Some(changes) = changes {
            self.spawn_listener(changes);
        }
    }

    pub fn snapshot(&self) -> SettingsSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Every value that lands in the snapshot after `Ready`, local or
    /// remote. The initial load is announced by the `Ready` transition on
    /// [`SettingsEngine::watch_state`] instead.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<SettingRecord> {
        self.changes.subscribe()
    }

    pub async fn wait_until_ready(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns once ready.
        let _ = state.wait_for(|state| *state == EngineState::Ready).await;
    }

    /// Validates, persists, then applies one setting.
    ///
    /// The snapshot changes only after the store acknowledges the write.
    /// Names outside [`SettingName`] are persisted but otherwise ignored.
    pub async fn update_setting(&self, name: &str, value: &str) -> Result<()> {
        self.ensure_ready()?;

        let known = name.parse::<SettingName>().ok();
        let value = match known {
            Some(setting) if setting.is_color() => {
                let normalized = normalize_hex(value);
                if Rgb::from_hex(&normalized).is_none() {
                    warn!(setting = %setting, value = %value, "rejected invalid color");
                    return Err(ThemeError::invalid_color(name, value));
                }
                normalized
            }
            _ => value.to_string(),
        };

        let record = SettingRecord::new(name, value);
        let guard = self.writes.lock().await;

        match timeout(self.config.store_timeout, self.store.upsert(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(setting = %record.setting_name, error = %err, "failed to persist setting");
                return Err(as_persistence_failure(err));
            }
            Err(_) => {
                error!(setting = %record.setting_name, "timed out persisting setting");
                return Err(ThemeError::PersistenceFailure(format!(
                    "store did not answer within {:?}",
                    self.config.store_timeout
                )));
            }
        }

        match known {
            Some(setting) => {
                if self.write_snapshot(setting, &record.setting_value) {
                    self.announce(setting, &record.setting_value);
                }
                if let Err(err) = self.applier.apply(setting, &record.setting_value) {
                    warn!(setting = %setting, error = %err, "persisted setting could not be applied");
                }
                info!(setting = %setting, value = %record.setting_value, "setting updated");
            }
            None => {
                debug!(setting = %record.setting_name, "persisted unrecognized setting");
            }
        }
        drop(guard);

        self.publish(&record).await;

        Ok(())
    }

    /// Applies a change accepted by another session. Never writes the store.
    ///
    /// The store is re-read for `record`'s name and its value wins; the
    /// carried value is used only when the store has no row for the name or
    /// cannot be reached. Returns whether the snapshot changed. Duplicates,
    /// unknown names and malformed colors are absorbed here and reported as
    /// `Ok(false)`.
    pub async fn apply_remote_change(&self, record: SettingRecord) -> Result<bool> {
        self.ensure_ready()?;

        let Some(setting) = record.name() else {
            debug!(setting = %record.setting_name, "ignoring change for unrecognized setting");
            return Ok(false);
        };

        let _guard = self.writes.lock().await;
        let value = match self.load_record(&record.setting_name).await {
            Some(stored) => stored.setting_value,
            None => record.setting_value,
        };
        Ok(self.apply_resolved(setting, value))
    }

    /// Re-reads one setting from the store and applies it. Used for
    /// notifications that name a setting without carrying its value.
    pub async fn refresh_setting(&self, name: &str) -> Result<bool> {
        self.ensure_ready()?;

        let Ok(setting) = name.parse::<SettingName>() else {
            debug!(setting = %name, "ignoring change for unrecognized setting");
            return Ok(false);
        };

        let _guard = self.writes.lock().await;
        match self.load_record(name).await {
            Some(stored) => Ok(self.apply_resolved(setting, stored.setting_value)),
            None => {
                debug!(setting = %name, "nothing stored for notified setting");
                Ok(false)
            }
        }
    }

    /// Re-reads the store and re-applies every setting, staying `Ready`.
    ///
    /// On failure the current snapshot is kept.
    pub async fn reload(&self) -> Result<()> {
        self.ensure_ready()?;

        let _guard = self.writes.lock().await;
        let records = self.load_records().await?;

        let previous = self.snapshot();
        let mut snapshot = previous.clone();
        let merged = merge_records(&mut snapshot, &records);
        self.applier.apply_all(&snapshot);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();

        for (setting, value) in snapshot.iter() {
            if previous.get(setting) != value {
                self.announce(setting, value);
            }
        }

        info!(stored = records.len(), applied = merged, "design settings reloaded");
        Ok(())
    }

    /// Stops remote delivery. Once this returns no further change reaches
    /// the snapshot or the surface.
    pub async fn shutdown(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            info!("Settings engine stopped listening for remote changes");
        }
    }

    fn spawn_listener(self: &Arc<Self>, mut changes: SettingChangeStream) {
        let engine: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            while let Some(event) = changes.next().await {
                let Some(engine) = engine.upgrade() else {
                    break;
                };
                let outcome = match event {
                    ChangeEvent::Changed(record) => {
                        engine.apply_remote_change(record).await.map(drop)
                    }
                    ChangeEvent::Touched { setting_name } => {
                        engine.refresh_setting(&setting_name).await.map(drop)
                    }
                    ChangeEvent::Resync => {
                        info!("change bus requested a resync; reloading settings");
                        engine.reload().await
                    }
                };
                if let Err(err) = outcome {
                    warn!(error = %err, "remote change rejected");
                }
            }
            debug!("remote change stream ended");
        });

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    async fn load_records(&self) -> Result<Vec<SettingRecord>> {
        match timeout(self.config.store_timeout, self.store.load_all()).await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(ThemeError::StoreUnavailable(reason))) => {
                Err(ThemeError::StoreUnavailable(reason))
            }
            Ok(Err(err)) => Err(ThemeError::StoreUnavailable(err.to_string())),
            Err(_) => Err(ThemeError::StoreUnavailable(format!(
                "store did not answer within {:?}",
                self.config.store_timeout
            ))),
        }
    }

    /// The stored record for `name`. Read failures are logged and treated
    /// as "nothing stored".
    async fn load_record(&self, name: &str) -> Option<SettingRecord> {
        match timeout(self.config.store_timeout, self.store.load(name)).await {
            Ok(Ok(record)) => record,
            Ok(Err(err)) => {
                warn!(setting = %name, error = %err, "could not re-read setting");
                None
            }
            Err(_) => {
                warn!(setting = %name, "timed out re-reading setting");
                None
            }
        }
    }

    /// Validates and applies a value the store vouched for. Caller holds the
    /// write lock.
    fn apply_resolved(&self, setting: SettingName, value: String) -> bool {
        let value = if setting.is_color() {
            let normalized = normalize_hex(&value);
            if Rgb::from_hex(&normalized).is_none() {
                let anomaly =
                    ThemeError::BusDelivery(format!("{setting} carried invalid color {value:?}"));
                warn!(error = %anomaly, "dropping remote change");
                return false;
            }
            normalized
        } else {
            value
        };

        if !self.write_snapshot(setting, &value) {
            debug!(setting = %setting, "remote change already applied");
            return false;
        }

        if let Err(err) = self.applier.apply(setting, &value) {
            warn!(setting = %setting, error = %err, "remote change could not be applied");
        }
        self.announce(setting, &value);
        info!(setting = %setting, value = %value, "applied remote change");
        true
    }

    fn announce(&self, setting: SettingName, value: &str) {
        // No listeners is fine.
        let _ = self.changes.send(SettingRecord::new(setting.as_str(), value));
    }

    async fn publish(&self, record: &SettingRecord) {
        match timeout(self.config.store_timeout, self.bus.publish(record)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(setting = %record.setting_name, error = %err, "failed to publish settings change");
            }
            Err(_) => {
                warn!(setting = %record.setting_name, "timed out publishing settings change");
            }
        }
    }

    fn write_snapshot(&self, setting: SettingName, value: &str) -> bool {
        self.snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(setting, value)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.state() == EngineState::Ready {
            Ok(())
        } else {
            Err(ThemeError::NotReady)
        }
    }
}

impl Drop for SettingsEngine {
    fn drop(&mut self) {
        if let Some(handle) = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}

fn as_persistence_failure(err: ThemeError) -> ThemeError {
    match err {
        ThemeError::PersistenceFailure(reason) => ThemeError::PersistenceFailure(reason),
        other => ThemeError::PersistenceFailure(other.to_string()),
    }
}

/// Overlays stored records on `snapshot`, skipping unknown names and colors
/// that do not parse. Returns how many records were taken.
fn merge_records(snapshot: &mut SettingsSnapshot, records: &[SettingRecord]) -> usize {
    let mut merged = 0;
    for record in records {
        let Some(setting) = record.name() else {
            debug!(setting = %record.setting_name, "skipping unrecognized stored setting");
            continue;
        };
        if setting.is_color() {
            let normalized = normalize_hex(&record.setting_value);
            if Rgb::from_hex(&normalized).is_none() {
                warn!(
                    setting = %setting,
                    value = %record.setting_value,
                    "stored color is invalid; keeping default"
                );
                continue;
            }
            snapshot.set(setting, normalized);
        } else {
            snapshot.set(setting, record.setting_value.as_str());
        }
        merged += 1;
    }
    merged
}
