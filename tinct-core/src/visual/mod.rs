//! Mapping from settings to the visual tokens they drive.

use std::fmt;
use std::sync::Arc;

use tinct_model::{
    Backdrop, COLOR_SETTINGS, GRADIENT_LIGHTEN, Rgb, SettingName,
    SettingsSnapshot, VisualToken,
};
use tracing::{debug, warn};

use crate::error::{Result, ThemeError};

pub mod surface;

pub use surface::{RenderSurface, SurfaceFrame, TokenSurface};

/// Translates a color setting into token writes on a [`RenderSurface`].
///
/// | setting | tokens |
/// |---|---|
/// | `primary_color` | primary, ring, sidebar primary, sidebar ring |
/// | `secondary_color` | secondary, card, muted, sidebar accent |
/// | `accent_color` | accent |
/// | `background_color` | background, sidebar background, popover, page backdrop |
#[derive(Clone)]
pub struct VisualEffectApplier {
    surface: Arc<dyn RenderSurface>,
}

impl fmt::Debug for VisualEffectApplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualEffectApplier").finish_non_exhaustive()
    }
}

impl VisualEffectApplier {
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self { surface }
    }

    /// Applies one setting. Text settings are a no-op; a value that does not
    /// parse as a color is rejected before any token is touched.
    pub fn apply(&self, name: SettingName, value: &str) -> Result<()> {
        let tokens = VisualToken::driven_by(name);
        if tokens.is_empty() {
            return Ok(());
        }

        let rgb = Rgb::from_hex(value)
            .ok_or_else(|| ThemeError::invalid_color(name.as_str(), value))?;

        debug!(setting = %name, value = %value, %rgb, "applying color");

        for token in tokens {
            self.surface.set_token(*token, rgb);
        }

        if name == SettingName::BackgroundColor {
            self.surface.set_backdrop(Backdrop {
                from: rgb,
                to: rgb.lighten(GRADIENT_LIGHTEN),
            });
        }

        Ok(())
    }

    /// Re-applies every color setting. Safe to repeat.
    pub fn apply_all(&self, snapshot: &SettingsSnapshot) {
        for name in COLOR_SETTINGS {
            if let Err(err) = self.apply(name, snapshot.get(name)) {
                warn!(setting = %name, error = %err, "skipping invalid color");
            }
        }
    }
}
