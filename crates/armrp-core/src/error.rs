use thiserror::Error;

/// Core error types for armrp operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown {kind} state: {value}")]
    UnknownState { kind: &'static str, value: String },

    #[error("Invalid resource ID: {0}")]
    InvalidResourceId(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new UnknownState error
    pub fn unknown_state(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownState {
            kind,
            value: value.into(),
        }
    }

    /// Create a new InvalidResourceId error
    pub fn invalid_resource_id(message: impl Into<String>) -> Self {
        Self::InvalidResourceId(message.into())
    }

    /// Check if this error was caused by caller input
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownState { .. } | Self::InvalidResourceId(_))
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_state_error() {
        let err = CoreError::unknown_state("provisioning", "Sleeping");
        assert_eq!(err.to_string(), "Unknown provisioning state: Sleeping");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_invalid_resource_id_error() {
        let err = CoreError::invalid_resource_id("name must not be empty");
        assert_eq!(err.to_string(), "Invalid resource ID: name must not be empty");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::JsonError(_)));
        assert!(!err.is_client_error());
    }
}
