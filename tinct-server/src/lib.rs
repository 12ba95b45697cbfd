//! # Tinct Server
//!
//! HTTP boundary for the Tinct settings engine: the settings API consumed by
//! the admin form, a server-sent events feed of token updates, and the
//! rendered theme stylesheet.

pub mod errors;
pub mod handlers;
pub mod infra;
pub mod routes;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use infra::app_state::AppState;

use handlers::{health::health_handler, settings::theme_css_handler};

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/theme.css", get(theme_css_handler))
        .merge(routes::create_api_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
