use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers::settings::{
    get_settings_handler, presets_handler, reload_settings_handler, settings_events_handler,
    update_setting_handler,
};
use crate::infra::app_state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings_handler))
        .route("/settings/presets", get(presets_handler))
        .route("/settings/events", get(settings_events_handler))
        .route("/settings/reload", post(reload_settings_handler))
        .route("/settings/{name}", put(update_setting_handler))
}
