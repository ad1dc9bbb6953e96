//! Audit Storage
//!
//! Records each reading and its verdict in a SQLite audit log, one
//! all-or-nothing transaction per record.

mod audit;

pub use audit::{AuditRecord, AuditStore, PersistResult, StoreOptions};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Fault raised by the store or its driver while connecting, inserting
    /// or committing
    #[error("Database error: {0}")]
    DatabaseError(#[source] sqlx::Error),
    /// Any other fault during a persistence attempt
    #[error("Unexpected error: {0}")]
    Unexpected(String),
    /// Connection descriptor could not be parsed
    #[error("Invalid connection descriptor: {0}")]
    InvalidDescriptor(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if is_store_fault(&err) {
            StorageError::DatabaseError(err)
        } else {
            StorageError::Unexpected(err.to_string())
        }
    }
}

/// Whether an sqlx error originates from the store or its connection,
/// as opposed to decoding or usage faults on our side
fn is_store_fault(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_faults_classified() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(StorageError::from(io), StorageError::DatabaseError(_)));
        assert!(matches!(
            StorageError::from(sqlx::Error::PoolTimedOut),
            StorageError::DatabaseError(_)
        ));
    }

    #[test]
    fn test_other_faults_are_unexpected() {
        let err = StorageError::from(sqlx::Error::ColumnNotFound("LogID".to_string()));
        assert!(matches!(err, StorageError::Unexpected(msg) if msg.contains("LogID")));

        let err = StorageError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StorageError::Unexpected(_)));
    }
}
