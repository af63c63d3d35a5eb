/// Core error types for Iseng
use std::fmt;
use thiserror::Error;

/// Result type alias using `IsengError`
pub type Result<T> = std::result::Result<T, IsengError>;

/// Why a mutation inside a transaction was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    /// Update or delete touched zero rows
    NoMatchingRow,
    /// Unique or check constraint violated
    Constraint,
    /// The transaction already reached a terminal state
    TransactionClosed,
    /// Any other store-level failure
    Store,
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WriteFailure::NoMatchingRow => "no matching row",
            WriteFailure::Constraint => "constraint violation",
            WriteFailure::TransactionClosed => "transaction closed",
            WriteFailure::Store => "store failure",
        };
        f.write_str(label)
    }
}

/// Core error type for Iseng
#[derive(Error, Debug)]
pub enum IsengError {
    /// No row matches the requested identifier
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Malformed request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store unreachable (connect, acquire, begin)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Read query failed
    #[error("Query error: {0}")]
    Query(String),

    /// Mutation rejected inside a transaction
    #[error("Write error ({kind}): {message}")]
    Write { kind: WriteFailure, message: String },

    /// Store rejected the commit
    #[error("Commit error: {0}")]
    Commit(String),

    /// Rollback failed after the operation had already failed
    #[error("Rollback error: {message} (after: {cause})")]
    Rollback {
        message: String,
        cause: Box<IsengError>,
    },

    /// Identity source exhausted
    #[error("Identity generation error: {0}")]
    Generation(String),
}

impl IsengError {
    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a write error of the given kind
    pub fn write(kind: WriteFailure, msg: impl Into<String>) -> Self {
        Self::Write {
            kind,
            message: msg.into(),
        }
    }

    /// Create a commit error
    pub fn commit(msg: impl Into<String>) -> Self {
        Self::Commit(msg.into())
    }

    /// Create a generation error
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Kind of a write error, `None` for every other variant
    pub fn write_failure(&self) -> Option<WriteFailure> {
        match self {
            Self::Write { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = IsengError::not_found("User", "abc");
        assert_eq!(err.to_string(), "User not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn write_failure_only_reported_for_write_errors() {
        let err = IsengError::write(WriteFailure::NoMatchingRow, "delete touched 0 rows");
        assert_eq!(err.write_failure(), Some(WriteFailure::NoMatchingRow));
        assert_eq!(IsengError::commit("boom").write_failure(), None);
    }

    #[test]
    fn rollback_error_keeps_the_original_cause() {
        let err = IsengError::Rollback {
            message: "connection reset".to_string(),
            cause: Box::new(IsengError::write(WriteFailure::Constraint, "duplicate id")),
        };
        let text = err.to_string();
        assert!(text.contains("connection reset"));
        assert!(text.contains("duplicate id"));
    }
}
