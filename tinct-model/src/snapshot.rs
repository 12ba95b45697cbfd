use crate::setting::SettingName;

pub const DEFAULT_PRIMARY_COLOR: &str = "#FF4656";
pub const DEFAULT_SECONDARY_COLOR: &str = "#0F1419";
pub const DEFAULT_ACCENT_COLOR: &str = "#F94555";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#1E2328";
pub const DEFAULT_SITE_TITLE: &str = "VALORANT";
pub const DEFAULT_SITE_DESCRIPTION: &str = "Een 5v5 character-based tactical FPS waar precieze gunplay wordt gecombineerd met unieke Agent abilities.";

/// Every recognized setting mapped to its current value.
///
/// A snapshot is always fully populated; [`SettingsSnapshot::default`] is the
/// compiled-in fallback used when the store is empty or unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettingsSnapshot {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub site_title: String,
    pub site_description: String,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            secondary_color: DEFAULT_SECONDARY_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            site_title: DEFAULT_SITE_TITLE.to_string(),
            site_description: DEFAULT_SITE_DESCRIPTION.to_string(),
        }
    }
}

impl SettingsSnapshot {
    pub fn get(&self, name: SettingName) -> &str {
        match name {
            SettingName::PrimaryColor => &self.primary_color,
            SettingName::SecondaryColor => &self.secondary_color,
            SettingName::AccentColor => &self.accent_color,
            SettingName::BackgroundColor => &self.background_color,
            SettingName::SiteTitle => &self.site_title,
            SettingName::SiteDescription => &self.site_description,
        }
    }

    /// Overwrites one value. Returns `false` when the value was already set.
    pub fn set(&mut self, name: SettingName, value: impl Into<String>) -> bool {
        let value = value.into();
        let slot = match name {
            SettingName::PrimaryColor => &mut self.primary_color,
            SettingName::SecondaryColor => &mut self.secondary_color,
            SettingName::AccentColor => &mut self.accent_color,
            SettingName::BackgroundColor => &mut self.background_color,
            SettingName::SiteTitle => &mut self.site_title,
            SettingName::SiteDescription => &mut self.site_description,
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingName, &str)> {
        SettingName::ALL.into_iter().map(|name| (name, self.get(name)))
    }
}
