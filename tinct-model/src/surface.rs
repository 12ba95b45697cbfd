//! Named visual parameters on the rendering surface.

use crate::color::Rgb;
use crate::setting::SettingName;

/// A color variable on the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VisualToken {
    Primary,
    Ring,
    SidebarPrimary,
    SidebarRing,
    Secondary,
    Card,
    Muted,
    SidebarAccent,
    Accent,
    Background,
    SidebarBackground,
    Popover,
}

impl VisualToken {
    /// CSS custom property carrying this token.
    pub fn css_var(&self) -> &'static str {
        match self {
            Self::Primary => "--primary",
            Self::Ring => "--ring",
            Self::SidebarPrimary => "--sidebar-primary",
            Self::SidebarRing => "--sidebar-ring",
            Self::Secondary => "--secondary",
            Self::Card => "--card",
            Self::Muted => "--muted",
            Self::SidebarAccent => "--sidebar-accent",
            Self::Accent => "--accent",
            Self::Background => "--background",
            Self::SidebarBackground => "--sidebar-background",
            Self::Popover => "--popover",
        }
    }

    /// Tokens driven by a setting. Text settings drive none.
    pub fn driven_by(name: SettingName) -> &'static [VisualToken] {
        match name {
            SettingName::PrimaryColor => &[
                Self::Primary,
                Self::Ring,
                Self::SidebarPrimary,
                Self::SidebarRing,
            ],
            SettingName::SecondaryColor => &[
                Self::Secondary,
                Self::Card,
                Self::Muted,
                Self::SidebarAccent,
            ],
            SettingName::AccentColor => &[Self::Accent],
            SettingName::BackgroundColor => &[
                Self::Background,
                Self::SidebarBackground,
                Self::Popover,
            ],
            SettingName::SiteTitle | SettingName::SiteDescription => &[],
        }
    }
}

/// Full-bleed page backdrop: a fixed, non-repeating diagonal gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Backdrop {
    pub from: Rgb,
    pub to: Rgb,
}

impl Backdrop {
    pub const ANGLE_DEG: u16 = 135;

    pub fn gradient(&self) -> String {
        format!(
            "linear-gradient({}deg, {} 0%, {} 100%)",
            Self::ANGLE_DEG,
            self.from.css_rgb(),
            self.to.css_rgb()
        )
    }

    /// Declarations for the page body.
    pub fn css_declarations(&self) -> String {
        format!(
            "background: {}; background-attachment: fixed; background-size: cover; background-repeat: no-repeat;",
            self.gradient()
        )
    }
}

/// One mutation applied to the surface, as pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum SurfaceUpdate {
    Token { token: VisualToken, value: Rgb },
    Backdrop { backdrop: Backdrop },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_color_setting_drives_tokens() {
        for name in crate::setting::COLOR_SETTINGS {
            assert!(!VisualToken::driven_by(name).is_empty(), "{name}");
        }
        assert!(VisualToken::driven_by(SettingName::SiteTitle).is_empty());
    }

    #[test]
    fn backdrop_renders_diagonal_gradient() {
        let backdrop = Backdrop {
            from: Rgb::new(30, 35, 40),
            to: Rgb::new(45, 50, 55),
        };
        assert_eq!(
            backdrop.gradient(),
            "linear-gradient(135deg, rgb(30, 35, 40) 0%, rgb(45, 50, 55) 100%)"
        );
        let css = backdrop.css_declarations();
        assert!(css.contains("background-attachment: fixed"));
        assert!(css.contains("background-repeat: no-repeat"));
    }
}
