use std::{convert::Infallible, pin::Pin, time::Duration};

use axum::{
    extract::{Path, State},
    http::header,
    response::{
        IntoResponse, Json, Sse,
        sse::{Event, KeepAlive},
    },
};
use tinct_core::SurfaceFrame;
use tinct_model::{
    ApiResponse, EngineState, PRESET_COLORS, SettingRecord, SettingsView, UpdateSettingRequest,
};
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};
use tracing::{info, warn};

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

pub async fn get_settings_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<SettingsView>> {
    Json(ApiResponse::success(state.settings_view()))
}

pub async fn update_setting_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<UpdateSettingRequest>,
) -> AppResult<Json<ApiResponse<SettingsView>>> {
    state
        .engine()
        .update_setting(&name, &request.setting_value)
        .await?;

    info!(setting = %name, "setting updated via API");

    Ok(Json(ApiResponse::success_with_message(
        state.settings_view(),
        format!("{name} updated"),
    )))
}

pub async fn presets_handler() -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::success(PRESET_COLORS.to_vec()))
}

pub async fn theme_css_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/css; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        state.surface().stylesheet(),
    )
}

pub async fn reload_settings_handler(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SettingsView>>> {
    state.engine().reload().await?;

    info!("settings reloaded via API");

    Ok(Json(ApiResponse::success_with_message(
        state.settings_view(),
        "settings reloaded",
    )))
}

/// Streams theme changes to a connected client.
///
/// The first event is always a `snapshot` carrying the current settings
/// view. After that, `surface` events carry token and backdrop writes and
/// `setting` events carry every value that lands in the snapshot, text
/// settings included. A new `snapshot` is sent when the engine becomes
/// ready and whenever this client falls behind, so it resyncs from the
/// snapshot instead of replaying missed updates.
pub async fn settings_events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(build_settings_stream(state)).keep_alive(default_keep_alive())
}

enum Feed {
    Frame(Option<Result<SurfaceFrame, BroadcastStreamRecvError>>),
    Setting(Option<Result<SettingRecord, BroadcastStreamRecvError>>),
    State(bool),
}

pub fn build_settings_stream(
    state: AppState,
) -> Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send + 'static>> {
    // Subscribe before reading the snapshot so nothing falls in between.
    let mut frames = BroadcastStream::new(state.surface().subscribe());
    let mut settings = BroadcastStream::new(state.engine().subscribe_changes());
    let mut engine_state = state.engine().watch_state();

    Box::pin(async_stream::stream! {
        let mut last_seen = state.surface().sequence();
        if let Some(event) = snapshot_event(&state.settings_view(), last_seen) {
            yield Ok::<Event, Infallible>(event);
        }

        loop {
            let feed = tokio::select! {
                frame = frames.next() => Feed::Frame(frame),
                setting = settings.next() => Feed::Setting(setting),
                changed = engine_state.changed() => Feed::State(changed.is_ok()),
            };

            let resync = match feed {
                Feed::Frame(Some(Ok(frame))) => {
                    if frame.sequence > last_seen {
                        last_seen = frame.sequence;
                        if let Some(event) = frame_event(&frame) {
                            yield Ok(event);
                        }
                    }
                    false
                }
                Feed::Setting(Some(Ok(record))) => {
                    if let Some(event) = setting_event(&record) {
                        yield Ok(event);
                    }
                    false
                }
                Feed::Frame(Some(Err(BroadcastStreamRecvError::Lagged(skipped))))
                | Feed::Setting(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "settings event client lagged; resending snapshot");
                    true
                }
                Feed::State(true) => *engine_state.borrow_and_update() == EngineState::Ready,
                Feed::Frame(None) | Feed::Setting(None) | Feed::State(false) => break,
            };

            if resync {
                last_seen = state.surface().sequence();
                if let Some(event) = snapshot_event(&state.settings_view(), last_seen) {
                    yield Ok(event);
                }
            }
        }
    })
}

fn snapshot_event(view: &SettingsView, sequence: u64) -> Option<Event> {
    match Event::default().event("snapshot").json_data(view) {
        Ok(event) => Some(event.id(sequence.to_string())),
        Err(err) => {
            warn!("failed to encode settings snapshot: {err}");
            None
        }
    }
}

fn frame_event(frame: &SurfaceFrame) -> Option<Event> {
    match Event::default().event("surface").json_data(&frame.update) {
        Ok(event) => Some(event.id(frame.sequence.to_string())),
        Err(err) => {
            warn!("failed to encode surface update: {err}");
            None
        }
    }
}

fn setting_event(record: &SettingRecord) -> Option<Event> {
    match Event::default().event("setting").json_data(record) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!("failed to encode setting change: {err}");
            None
        }
    }
}

fn default_keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(15))
        .text("keep-alive")
}
