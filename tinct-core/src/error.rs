use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Invalid color value for {name}: {value:?}")]
    InvalidColorValue { name: String, value: String },

    #[error("Failed to persist setting: {0}")]
    PersistenceFailure(String),

    #[error("Settings store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Change bus unavailable: {0}")]
    BusUnavailable(String),

    /// Malformed or out-of-place notification. Logged by the engine, never
    /// returned from its public operations.
    #[error("Change bus delivery anomaly: {0}")]
    BusDelivery(String),

    #[error("Settings engine is not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ThemeError {
    pub fn invalid_color(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidColorValue {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ThemeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "settings file");
        let err: ThemeError = io_err.into();
        assert!(matches!(err, ThemeError::Io(_)));
        assert!(err.to_string().contains("settings file"));
    }

    #[test]
    fn error_display() {
        let err = ThemeError::invalid_color("primary_color", "zzzzzz");
        assert_eq!(
            err.to_string(),
            "Invalid color value for primary_color: \"zzzzzz\""
        );
        let err = ThemeError::PersistenceFailure("connection reset".into());
        assert_eq!(err.to_string(), "Failed to persist setting: connection reset");
    }
}
