#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, BodyDataStream, to_bytes},
    http::{Request, Response},
};
use serde_json::Value;
use tinct_core::{
    EngineConfig, InMemorySettingsStore, InProcChangeBus, Result, SettingsEngine, SettingsStore,
    ThemeError, TokenSurface,
};
use tinct_model::SettingRecord;
use tinct_server::{AppState, create_app};
use tokio_stream::StreamExt;

/// In-memory store whose writes can be switched off.
#[derive(Debug, Default)]
pub struct ToggleStore {
    inner: InMemorySettingsStore,
    reject_writes: AtomicBool,
}

impl ToggleStore {
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Writes straight into the backing store, as another process would.
    pub async fn write_behind(&self, name: &str, value: &str) {
        self.inner
            .upsert(&SettingRecord::new(name, value))
            .await
            .unwrap();
    }
}

#[async_trait]
impl SettingsStore for ToggleStore {
    async fn load_all(&self) -> Result<Vec<SettingRecord>> {
        self.inner.load_all().await
    }

    async fn upsert(&self, record: &SettingRecord) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(ThemeError::PersistenceFailure("store offline".into()));
        }
        self.inner.upsert(record).await
    }
}

#[derive(Debug)]
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<ToggleStore>,
}

pub fn test_app() -> TestApp {
    test_app_with_surface(TokenSurface::default())
}

pub fn test_app_with_surface(surface: TokenSurface) -> TestApp {
    let store = Arc::new(ToggleStore::default());
    let surface = Arc::new(surface);
    let engine = Arc::new(SettingsEngine::new(
        store.clone(),
        Arc::new(InProcChangeBus::default()),
        surface.clone(),
        EngineConfig::default(),
    ));
    let state = AppState::new(engine, surface);
    TestApp {
        router: create_app(state.clone()),
        state,
        store,
    }
}

pub async fn ready_app() -> TestApp {
    let app = test_app();
    app.state.engine().initialize().await;
    app
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn put_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Reads event-stream chunks until the text read so far contains `needle`.
pub async fn read_until(body: &mut BodyDataStream, needle: &str) -> String {
    let mut seen = String::new();
    while !seen.contains(needle) {
        let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .unwrap_or_else(|_| panic!("no {needle:?} in {seen:?}"))
            .expect("stream open")
            .unwrap();
        seen.push_str(std::str::from_utf8(&chunk).unwrap());
    }
    seen
}
