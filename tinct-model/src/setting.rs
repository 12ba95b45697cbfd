use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// The closed set of settings the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SettingName {
    PrimaryColor,
    SecondaryColor,
    AccentColor,
    BackgroundColor,
    SiteTitle,
    SiteDescription,
}

/// Settings whose values are hex colors and drive visual tokens.
pub const COLOR_SETTINGS: [SettingName; 4] = [
    SettingName::PrimaryColor,
    SettingName::SecondaryColor,
    SettingName::AccentColor,
    SettingName::BackgroundColor,
];

impl SettingName {
    pub const ALL: [SettingName; 6] = [
        SettingName::PrimaryColor,
        SettingName::SecondaryColor,
        SettingName::AccentColor,
        SettingName::BackgroundColor,
        SettingName::SiteTitle,
        SettingName::SiteDescription,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryColor => "primary_color",
            Self::SecondaryColor => "secondary_color",
            Self::AccentColor => "accent_color",
            Self::BackgroundColor => "background_color",
            Self::SiteTitle => "site_title",
            Self::SiteDescription => "site_description",
        }
    }

    pub fn is_color(&self) -> bool {
        COLOR_SETTINGS.contains(self)
    }
}

impl fmt::Display for SettingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingName {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ModelError::UnknownSetting(s.to_string()))
    }
}

/// A persisted setting row, and the payload carried by change notifications.
///
/// The name stays a plain string: stores may hold names this build does not
/// recognize, and those must survive a load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettingRecord {
    pub setting_name: String,
    pub setting_value: String,
}

impl SettingRecord {
    pub fn new(
        setting_name: impl Into<String>,
        setting_value: impl Into<String>,
    ) -> Self {
        Self {
            setting_name: setting_name.into(),
            setting_value: setting_value.into(),
        }
    }

    /// The recognized setting this record targets, if any.
    pub fn name(&self) -> Option<SettingName> {
        self.setting_name.parse().ok()
    }
}

/// Lifecycle of a settings engine. It only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EngineState {
    #[default]
    Uninitialized,
    Loading,
    Ready,
}

impl EngineState {
    pub fn is_loading(&self) -> bool {
        !matches!(self, Self::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        for name in SettingName::ALL {
            assert_eq!(name.as_str().parse::<SettingName>(), Ok(name));
        }
        assert_eq!(
            "hero_image".parse::<SettingName>(),
            Err(ModelError::UnknownSetting("hero_image".into()))
        );
    }

    #[test]
    fn color_membership_is_explicit() {
        assert!(SettingName::BackgroundColor.is_color());
        assert!(!SettingName::SiteTitle.is_color());
        assert!(!SettingName::SiteDescription.is_color());
    }

    #[test]
    fn names_containing_color_are_not_settings() {
        assert!("font_color_scheme".parse::<SettingName>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn record_wire_shape() {
        let record = SettingRecord::new("primary_color", "#00FF00");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "setting_name": "primary_color",
                "setting_value": "#00FF00"
            })
        );
        assert_eq!(record.name(), Some(SettingName::PrimaryColor));
    }

    #[test]
    fn uninitialized_counts_as_loading() {
        assert!(EngineState::Uninitialized.is_loading());
        assert!(EngineState::Loading.is_loading());
        assert!(!EngineState::Ready.is_loading());
    }
}
