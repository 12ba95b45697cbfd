use std::{fmt, sync::Arc};

use tinct_core::{SettingsEngine, TokenSurface};
use tinct_model::SettingsView;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<SettingsEngine>,
    surface: Arc<TokenSurface>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// `surface` must be the surface `engine` renders to.
    pub fn new(engine: Arc<SettingsEngine>, surface: Arc<TokenSurface>) -> Self {
        Self { engine, surface }
    }

    pub fn engine(&self) -> &Arc<SettingsEngine> {
        &self.engine
    }

    pub fn surface(&self) -> &Arc<TokenSurface> {
        &self.surface
    }

    pub fn settings_view(&self) -> SettingsView {
        SettingsView::new(self.engine.state(), self.engine.snapshot())
    }
}
