use thiserror::Error;

/// Top-level error type for the Rally system.
///
/// Subsystem crates define their own error types and convert into
/// `RallyError` where a failure crosses a crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RallyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for RallyError {
    fn from(err: toml::de::Error) -> Self {
        RallyError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RallyError {
    fn from(err: toml::ser::Error) -> Self {
        RallyError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RallyError {
    fn from(err: serde_json::Error) -> Self {
        RallyError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Rally operations.
pub type Result<T> = std::result::Result<T, RallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RallyError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = RallyError::Model("upstream returned 503".to_string());
        assert_eq!(err.to_string(), "Model error: upstream returned 503");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RallyError = io_err.into();
        assert!(matches!(err, RallyError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: RallyError = parse_err.into();
        assert!(matches!(err, RallyError::Config(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: RallyError = json_err.into();
        assert!(matches!(err, RallyError::Serialization(_)));
    }
}
