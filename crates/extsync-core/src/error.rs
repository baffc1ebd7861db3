use thiserror::Error;

/// Core error types for extsync source and specification handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown extension type: {0}")]
    UnknownType(String),

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Invalid configuration for '{handle}': {message}")]
    InvalidConfig { handle: String, message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new UnknownType error
    pub fn unknown_type(kind: impl Into<String>) -> Self {
        Self::UnknownType(kind.into())
    }

    /// Create a new InvalidHandle error
    pub fn invalid_handle(handle: impl Into<String>) -> Self {
        Self::InvalidHandle(handle.into())
    }

    /// Create a new InvalidConfig error
    pub fn invalid_config(handle: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            handle: handle.into(),
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownType(_) | Self::InvalidHandle(_) => ErrorCategory::Validation,
            Self::InvalidConfig { .. } => ErrorCategory::Configuration,
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Configuration,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Configuration => write!(f, "configuration"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_error() {
        let err = CoreError::unknown_type("mystery_widget");
        assert_eq!(err.to_string(), "Unknown extension type: mystery_widget");
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_invalid_config_error() {
        let err = CoreError::invalid_config("webhook-subscription", "instances must be objects");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'webhook-subscription': instances must be objects"
        );
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Configuration.to_string(), "configuration");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
    }
}
