//! Advisor Error Types

use inference_engine::InferenceError;
use storage::StorageError;
use thiserror::Error;

/// Startup failures. Anything raised here stops the process before a reading
/// is collected.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Audit database connection string not found (set connection_strings.audit_db)")]
    MissingConnectionString,

    #[error("Audit store setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Classifier setup failed: {0}")]
    Classifier(#[from] InferenceError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;
