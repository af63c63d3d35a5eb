/// Storage-specific errors
use iseng_core::{IsengError, WriteFailure};
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types, classified by the step that failed
#[derive(Error, Debug)]
pub enum StorageError {
    /// Could not reach the store (connect, acquire, begin)
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Read query execution error
    #[error("Query error: {0}")]
    Query(#[source] sqlx::Error),

    /// Mutation rejected by the store
    #[error("Write error: {0}")]
    Write(#[source] sqlx::Error),

    /// Commit rejected by the store
    #[error("Commit error: {0}")]
    Commit(#[source] sqlx::Error),

    /// Rollback could not be completed
    #[error("Rollback error: {0}")]
    Rollback(#[source] sqlx::Error),

    /// A stored row could not be turned back into a domain value
    #[error("Decode error: {0}")]
    Decode(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Database error from `SQLx`
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    /// Which kind of write failure a rejected mutation represents
    fn write_failure(err: &sqlx::Error) -> WriteFailure {
        match err {
            sqlx::Error::Database(db)
                if db.is_unique_violation()
                    || db.is_check_violation()
                    || db.is_foreign_key_violation() =>
            {
                WriteFailure::Constraint
            }
            _ => WriteFailure::Store,
        }
    }
}

impl From<StorageError> for IsengError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Connection(e) | StorageError::Database(e) => {
                IsengError::connection(e.to_string())
            }
            StorageError::Query(e) => IsengError::query(e.to_string()),
            StorageError::Write(e) => IsengError::write(StorageError::write_failure(&e), e.to_string()),
            StorageError::Commit(e) => IsengError::commit(e.to_string()),
            StorageError::Rollback(e) => IsengError::connection(format!("rollback failed: {}", e)),
            StorageError::Decode(msg) => IsengError::query(msg),
            StorageError::Migration(e) => IsengError::connection(format!("migration failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_become_connection_errors() {
        let err: IsengError = StorageError::Connection(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, IsengError::Connection(_)));
    }

    #[test]
    fn non_database_write_errors_are_store_failures() {
        let err: IsengError = StorageError::Write(sqlx::Error::PoolClosed).into();
        assert_eq!(err.write_failure(), Some(WriteFailure::Store));
    }

    #[test]
    fn commit_errors_keep_their_class() {
        let err: IsengError = StorageError::Commit(sqlx::Error::WorkerCrashed).into();
        assert!(matches!(err, IsengError::Commit(_)));
    }
}
