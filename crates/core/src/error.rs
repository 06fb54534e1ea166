// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Submission rejected: {0}")]
    Rejected(#[from] crate::domain::Rejection),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Local filesystem faults (download directory sweeps)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in the infra-stats crate
// by mapping into AppError::StorageUnavailable(String)

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rejection;

    #[test]
    fn test_conversions_into_app_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(AppError::from(io), AppError::Io(_)));

        let rejected: AppError = Rejection::CooldownActive { remaining_seconds: 3 }.into();
        assert_eq!(
            rejected.to_string(),
            "Submission rejected: Cooldown active: 3s remaining"
        );
    }
}
