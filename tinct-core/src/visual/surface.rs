use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tinct_model::{Backdrop, Rgb, SurfaceUpdate, VisualToken};
use tokio::sync::broadcast;

const DEFAULT_UPDATE_CAPACITY: usize = 256;

/// Where visual tokens end up. Writes are whole-value overwrites of
/// independent tokens, so implementations need no ordering beyond
/// last-write-wins.
pub trait RenderSurface: Send + Sync {
    fn set_token(&self, token: VisualToken, value: Rgb);

    fn set_backdrop(&self, backdrop: Backdrop);
}

/// A surface update tagged with its position in the surface's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceFrame {
    pub sequence: u64,
    pub update: SurfaceUpdate,
}

#[derive(Debug, Default)]
struct SurfaceState {
    tokens: BTreeMap<VisualToken, Rgb>,
    backdrop: Option<Backdrop>,
}

/// In-process surface: holds the current tokens, renders them as a
/// stylesheet, and streams every write to connected clients.
pub struct TokenSurface {
    state: RwLock<SurfaceState>,
    updates: broadcast::Sender<SurfaceFrame>,
    sequence: AtomicU64,
}

impl fmt::Debug for TokenSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSurface")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .field("subscribers", &self.updates.receiver_count())
            .finish()
    }
}

impl Default for TokenSurface {
    fn default() -> Self {
        Self::new(DEFAULT_UPDATE_CAPACITY)
    }
}

impl TokenSurface {
    pub fn new(update_capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(update_capacity.max(1));
        Self {
            state: RwLock::new(SurfaceState::default()),
            updates,
            sequence: AtomicU64::new(0),
        }
    }

    pub fn token(&self, token: VisualToken) -> Option<Rgb> {
        self.read(|state| state.tokens.get(&token).copied())
    }

    pub fn tokens(&self) -> BTreeMap<VisualToken, Rgb> {
        self.read(|state| state.tokens.clone())
    }

    pub fn backdrop(&self) -> Option<Backdrop> {
        self.read(|state| state.backdrop)
    }

    /// Number of updates applied so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceFrame> {
        self.updates.subscribe()
    }

    /// Current tokens as CSS custom properties plus the body backdrop.
    pub fn stylesheet(&self) -> String {
        self.read(|state| {
            let mut css = String::from(":root {\n");
            for (token, value) in &state.tokens {
                let _ = writeln!(css, "  {}: {};", token.css_var(), value);
            }
            css.push_str("}\n");
            if let Some(backdrop) = &state.backdrop {
                let _ = writeln!(css, "body {{\n  {}\n}}", backdrop.css_declarations());
            }
            css
        })
    }

    fn read<T>(&self, f: impl FnOnce(&SurfaceState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write(&self, f: impl FnOnce(&mut SurfaceState), update: SurfaceUpdate) {
        {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard);
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let _ = self.updates.send(SurfaceFrame { sequence, update });
    }
}

impl RenderSurface for TokenSurface {
    fn set_token(&self, token: VisualToken, value: Rgb) {
        self.write(
            |state| {
                state.tokens.insert(token, value);
            },
            SurfaceUpdate::Token { token, value },
        );
    }

    fn set_backdrop(&self, backdrop: Backdrop) {
        self.write(
            |state| state.backdrop = Some(backdrop),
            SurfaceUpdate::Backdrop { backdrop },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins() {
        let surface = TokenSurface::default();
        surface.set_token(VisualToken::Accent, Rgb::new(1, 2, 3));
        surface.set_token(VisualToken::Accent, Rgb::new(249, 69, 85));

        assert_eq!(surface.token(VisualToken::Accent), Some(Rgb::new(249, 69, 85)));
        assert_eq!(surface.sequence(), 2);
    }

    #[test]
    fn stylesheet_lists_tokens_and_backdrop() {
        let surface = TokenSurface::default();
        surface.set_token(VisualToken::Background, Rgb::new(30, 35, 40));
        surface.set_backdrop(Backdrop {
            from: Rgb::new(30, 35, 40),
            to: Rgb::new(45, 50, 55),
        });

        let css = surface.stylesheet();
        assert!(css.contains("--background: 30 35 40;"));
        assert!(css.contains("rgb(45, 50, 55) 100%"));
        assert!(css.starts_with(":root {"));
    }

    #[tokio::test]
    async fn subscribers_see_sequenced_updates() {
        let surface = TokenSurface::default();
        let mut updates = surface.subscribe();

        surface.set_token(VisualToken::Ring, Rgb::new(0, 255, 0));

        let frame = updates.recv().await.expect("frame");
        assert_eq!(frame.sequence, 1);
        assert_eq!(
            frame.update,
            SurfaceUpdate::Token {
                token: VisualToken::Ring,
                value: Rgb::new(0, 255, 0),
            }
        );
    }
}
