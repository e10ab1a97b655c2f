//! Core Error Types
//!
//! Defines error types for the newcode core library.

use thiserror::Error;

use crate::settings::SettingsError;

/// Core result type alias
pub type CoreResult<T> = Result<T, CoreError>;

/// Core errors
#[derive(Debug, Error)]
pub enum CoreError {
    /// Settings error
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Entry not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },
}

impl CoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Check if this error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CoreError::not_found("Agent", "husky");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Agent not found: husky");
    }

    #[test]
    fn test_settings_error_conversion() {
        let err: CoreError = SettingsError::InvalidValue {
            field: "user_name".into(),
            message: "must not be empty".into(),
        }
        .into();
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "settings error: invalid value for user_name: must not be empty"
        );
    }
}
