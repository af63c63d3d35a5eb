//! Scoped transaction handling for the write path
//!
//! Every write follows *open, register rollback, mutate, commit*:
//!
//! ```rust,ignore
//! let mut scope = TransactionScope::begin(writer).await?;
//! let outcome: Result<()> = async {
//!     writer.create_user(scope.tx(), &user).await?;
//!     scope.commit().await
//! }
//! .await;
//! scope.close(outcome).await?;
//! ```
//!
//! [`TransactionScope::close`] always asks the writer to roll back. Rollback
//! after commit is a no-op, so exactly one of "mutation committed" or
//! "nothing visible" holds once `close` returns, whichever step failed.
//! A scope dropped without `close` leaves the open `Tx` to its own drop glue.

use crate::error::{IsengError, Result};
use crate::traits::UserWriter;

/// Lifecycle of a writer transaction; both non-open states are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

/// An open transaction paired with the writer that owns it
pub struct TransactionScope<'w, W: UserWriter + ?Sized> {
    writer: &'w W,
    tx: W::Tx,
}

impl<'w, W: UserWriter + ?Sized> TransactionScope<'w, W> {
    /// Open a transaction on `writer`
    ///
    /// # Errors
    /// Propagates the writer's `begin_transaction` error; nothing needs cleanup then
    pub async fn begin(writer: &'w W) -> Result<Self> {
        let tx = writer.begin_transaction().await?;
        Ok(Self { writer, tx })
    }

    /// The transaction handle, for passing to the writer's mutations
    pub fn tx(&mut self) -> &mut W::Tx {
        &mut self.tx
    }

    /// Commit the transaction
    pub async fn commit(&mut self) -> Result<()> {
        self.writer.commit_transaction(&mut self.tx).await
    }

    /// Release the scope, rolling back unconditionally
    ///
    /// `outcome` is the result of the work done inside the scope. A rollback
    /// failure is never swallowed: on its own it is returned as is, and after
    /// a failed `outcome` it is returned as `IsengError::Rollback` carrying
    /// the original error as its cause.
    pub async fn close<T>(mut self, outcome: Result<T>) -> Result<T> {
        let rollback = self.writer.rollback_transaction(&mut self.tx).await;

        match (outcome, rollback) {
            (outcome, Ok(())) => outcome,
            (Ok(_), Err(err)) => {
                tracing::error!(error = %err, "Rollback failed after a successful operation");
                Err(err)
            }
            (Err(cause), Err(err)) => {
                tracing::error!(error = %err, cause = %cause, "Rollback failed after a failed operation");
                Err(IsengError::Rollback {
                    message: err.to_string(),
                    cause: Box::new(cause),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WriteFailure;
    use crate::testing::{InMemoryStore, InMemoryWriter};
    use crate::types::{User, UserId};
    use chrono::NaiveDate;

    fn user(id: &str) -> User {
        User {
            id: UserId::new(id),
            name: "Ann".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            created_at: 10,
            updated_at: 10,
        }
    }

    #[tokio::test]
    async fn rollback_after_commit_changes_nothing() {
        let writer = InMemoryWriter::new(InMemoryStore::new());
        let mut tx = writer.begin_transaction().await.unwrap();
        writer.create_user(&mut tx, &user("a")).await.unwrap();
        writer.commit_transaction(&mut tx).await.unwrap();

        writer.rollback_transaction(&mut tx).await.unwrap();
        writer.rollback_transaction(&mut tx).await.unwrap();

        assert_eq!(tx.state(), TransactionState::Committed);
        assert_eq!(writer.store().len(), 1);
        assert_eq!(writer.rolled_back(), 0);
    }

    #[tokio::test]
    async fn mutation_after_rollback_is_rejected() {
        let writer = InMemoryWriter::new(InMemoryStore::new());
        let mut tx = writer.begin_transaction().await.unwrap();
        writer.rollback_transaction(&mut tx).await.unwrap();

        let err = writer.create_user(&mut tx, &user("a")).await.unwrap_err();
        assert_eq!(err.write_failure(), Some(WriteFailure::TransactionClosed));
        assert!(matches!(
            writer.commit_transaction(&mut tx).await,
            Err(IsengError::Commit(_))
        ));
    }

    #[tokio::test]
    async fn close_discards_uncommitted_work() {
        let writer = InMemoryWriter::new(InMemoryStore::new());
        let mut scope = TransactionScope::begin(&writer).await.unwrap();
        writer.create_user(scope.tx(), &user("a")).await.unwrap();

        let outcome: Result<()> = Err(IsengError::validation("caller gave up"));
        let err = scope.close(outcome).await.unwrap_err();

        assert!(matches!(err, IsengError::Validation(_)));
        assert!(writer.store().is_empty());
        assert_eq!(writer.rolled_back(), 1);
    }

    #[tokio::test]
    async fn close_reports_rollback_failure_on_success_path() {
        let writer = InMemoryWriter::new(InMemoryStore::new());
        writer.fail_rollback(true);
        let scope = TransactionScope::begin(&writer).await.unwrap();

        let err = scope.close(Ok(())).await.unwrap_err();

        assert!(matches!(err, IsengError::Connection(_)));
    }
}
