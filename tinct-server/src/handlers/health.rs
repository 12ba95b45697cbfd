use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

/// Liveness plus the engine state; a loading engine is still healthy.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "engine": state.engine().state(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
