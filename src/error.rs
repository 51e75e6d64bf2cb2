// src/error.rs
// Standardized error types for Palaver

use thiserror::Error;

/// Main error type for the Palaver library
#[derive(Error, Debug)]
pub enum PalaverError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dialog '{0}' is not registered")]
    DialogNotFound(String),

    #[error("dialog '{0}' is already registered")]
    DuplicateDialog(String),

    #[error("misuse: {0}")]
    Misuse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown error: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Convenience type alias for Result using PalaverError
pub type Result<T> = std::result::Result<T, PalaverError>;

impl From<String> for PalaverError {
    fn from(s: String) -> Self {
        PalaverError::Other(s)
    }
}

impl From<PalaverError> for String {
    fn from(err: PalaverError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_not_found_error() {
        let err = PalaverError::DialogNotFound("greeting".to_string());
        assert!(err.to_string().contains("greeting"));
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_duplicate_dialog_error() {
        let err = PalaverError::DuplicateDialog("greeting".to_string());
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_misuse_error() {
        let err = PalaverError::Misuse("next() called twice".to_string());
        assert!(err.to_string().contains("misuse"));
        assert!(err.to_string().contains("next() called twice"));
    }

    #[test]
    fn test_from_string() {
        let err: PalaverError = "some error".to_string().into();
        assert!(matches!(err, PalaverError::Other(_)));
        assert!(err.to_string().contains("some error"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: PalaverError = json_err.into();
        assert!(matches!(err, PalaverError::Json(_)));
    }

    #[test]
    fn test_into_string() {
        let err = PalaverError::InvalidInput("missing options".to_string());
        let s: String = err.into();
        assert!(s.contains("invalid input"));
    }
}
