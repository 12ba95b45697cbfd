#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tinct_core::{
    ChangeBus, ChangeEvent, EngineConfig, InMemorySettingsStore, InProcChangeBus, RenderSurface,
    Result, SettingChangeStream, SettingsEngine, SettingsStore, ThemeError, TokenSurface,
};
use tinct_model::{Backdrop, Rgb, SettingRecord, VisualToken};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

/// In-memory store that records every write and can be told to fail or hang.
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemorySettingsStore,
    upserts: Mutex<Vec<SettingRecord>>,
    loads: AtomicUsize,
    fail_writes: AtomicBool,
    fail_loads: AtomicBool,
    stall_writes: AtomicBool,
    during_load: Mutex<Option<(Arc<InProcChangeBus>, SettingRecord)>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = SettingRecord>) -> Self {
        Self {
            inner: InMemorySettingsStore::with_records(records),
            ..Self::default()
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn stall_writes(&self, stall: bool) {
        self.stall_writes.store(stall, Ordering::SeqCst);
    }

    /// On the next `load_all`, after the result has been read, stores
    /// `record` and publishes it on `bus`, the way a concurrent session
    /// writing mid-load would.
    pub fn write_during_load(&self, bus: Arc<InProcChangeBus>, record: SettingRecord) {
        *self.during_load.lock().unwrap() = Some((bus, record));
    }

    pub fn upserts(&self) -> Vec<SettingRecord> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub async fn stored(&self, name: &str) -> Option<String> {
        self.inner.get(name).await
    }

    /// Writes straight into the backing map, as another process would.
    pub async fn write_behind(&self, name: &str, value: &str) {
        self.inner
            .upsert(&SettingRecord::new(name, value))
            .await
            .unwrap();
    }
}

#[async_trait]
impl SettingsStore for RecordingStore {
    async fn load_all(&self) -> Result<Vec<SettingRecord>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ThemeError::StoreUnavailable("connection refused".into()));
        }
        let records = self.inner.load_all().await?;
        let during_load = self.during_load.lock().unwrap().take();
        if let Some((bus, record)) = during_load {
            self.inner.upsert(&record).await?;
            bus.publish(&record).await?;
        }
        Ok(records)
    }

    async fn load(&self, setting_name: &str) -> Result<Option<SettingRecord>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(ThemeError::StoreUnavailable("connection refused".into()));
        }
        self.inner.load(setting_name).await
    }

    async fn upsert(&self, record: &SettingRecord) -> Result<()> {
        if self.stall_writes.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ThemeError::PersistenceFailure("write rejected".into()));
        }
        self.inner.upsert(record).await?;
        self.upserts.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Forwards to `inner`, but every publish first waits `delay`.
#[derive(Debug)]
pub struct SlowPublishBus<B> {
    inner: Arc<B>,
    delay: Duration,
}

impl<B> SlowPublishBus<B> {
    pub fn new(inner: Arc<B>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<B: ChangeBus> ChangeBus for SlowPublishBus<B> {
    async fn publish(&self, record: &SettingRecord) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.publish(record).await
    }

    async fn subscribe(&self) -> Result<SettingChangeStream> {
        self.inner.subscribe().await
    }
}

/// Bus whose deliveries are pushed by the test.
#[derive(Debug)]
pub struct ScriptedBus {
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for ScriptedBus {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { events }
    }
}

impl ScriptedBus {
    pub fn deliver(&self, event: ChangeEvent) {
        self.events.send(event).unwrap();
    }
}

#[async_trait]
impl ChangeBus for ScriptedBus {
    async fn publish(&self, _record: &SettingRecord) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&self) -> Result<SettingChangeStream> {
        let stream =
            BroadcastStream::new(self.events.subscribe()).filter_map(|event| event.ok());
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Token(VisualToken, Rgb),
    Backdrop(Backdrop),
}

/// Surface that keeps the real token state and a log of every call.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    tokens: TokenSurface,
    calls: Mutex<Vec<SurfaceCall>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self, token: VisualToken) -> Option<Rgb> {
        self.tokens.token(token)
    }

    pub fn backdrop(&self) -> Option<Backdrop> {
        self.tokens.backdrop()
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RenderSurface for RecordingSurface {
    fn set_token(&self, token: VisualToken, value: Rgb) {
        self.calls
            .lock()
            .unwrap()
            .push(SurfaceCall::Token(token, value));
        self.tokens.set_token(token, value);
    }

    fn set_backdrop(&self, backdrop: Backdrop) {
        self.calls
            .lock()
            .unwrap()
            .push(SurfaceCall::Backdrop(backdrop));
        self.tokens.set_backdrop(backdrop);
    }
}

pub struct Harness {
    pub engine: Arc<SettingsEngine>,
    pub store: Arc<RecordingStore>,
    pub surface: Arc<RecordingSurface>,
}

pub fn harness(store: RecordingStore, bus: Arc<dyn ChangeBus>) -> Harness {
    harness_with_config(store, bus, EngineConfig::default())
}

pub fn harness_with_config(
    store: RecordingStore,
    bus: Arc<dyn ChangeBus>,
    config: EngineConfig,
) -> Harness {
    let store = Arc::new(store);
    let surface = Arc::new(RecordingSurface::new());
    let engine = Arc::new(SettingsEngine::new(
        store.clone(),
        bus,
        surface.clone(),
        config,
    ));
    Harness {
        engine,
        store,
        surface,
    }
}

/// Polls `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
