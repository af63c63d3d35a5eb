use crate::error::StorageError;
use crate::users;
use async_trait::async_trait;
use iseng_core::{
    IsengError, Result, TransactionState, User, UserId, UserWriter, WriteFailure,
};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

/// Open `SQLite` transaction handed out by [`SqlUserWriter`]
///
/// The underlying transaction is consumed on commit or rollback, after which
/// the handle only remembers how it ended.
pub struct SqlTransaction {
    inner: Option<Transaction<'static, Sqlite>>,
    state: TransactionState,
}

impl SqlTransaction {
    pub fn state(&self) -> TransactionState {
        self.state
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        let state = self.state;
        match self.inner.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(IsengError::write(
                WriteFailure::TransactionClosed,
                format!("transaction is {:?}", state),
            )),
        }
    }
}

impl std::fmt::Debug for SqlTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlTransaction")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// [`UserWriter`] backed by the primary `SQLite` pool
#[derive(Debug, Clone)]
pub struct SqlUserWriter {
    pool: SqlitePool,
}

impl SqlUserWriter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn expect_one_row(rows: u64, action: &str, id: &UserId) -> Result<()> {
    if rows == 0 {
        return Err(IsengError::write(
            WriteFailure::NoMatchingRow,
            format!("{} matched no user {}", action, id),
        ));
    }
    Ok(())
}

#[async_trait]
impl UserWriter for SqlUserWriter {
    type Tx = SqlTransaction;

    async fn begin_transaction(&self) -> Result<SqlTransaction> {
        let tx = self.pool.begin().await.map_err(StorageError::Connection)?;
        Ok(SqlTransaction {
            inner: Some(tx),
            state: TransactionState::Open,
        })
    }

    async fn commit_transaction(&self, tx: &mut SqlTransaction) -> Result<()> {
        let Some(inner) = tx.inner.take() else {
            return Err(IsengError::commit(format!(
                "cannot commit a transaction that is {:?}",
                tx.state
            )));
        };

        match inner.commit().await {
            Ok(()) => {
                tx.state = TransactionState::Committed;
                Ok(())
            }
            Err(e) => {
                // A failed commit leaves nothing applied
                tx.state = TransactionState::RolledBack;
                Err(StorageError::Commit(e).into())
            }
        }
    }

    async fn rollback_transaction(&self, tx: &mut SqlTransaction) -> Result<()> {
        let Some(inner) = tx.inner.take() else {
            return Ok(());
        };

        tx.state = TransactionState::RolledBack;
        inner.rollback().await.map_err(StorageError::Rollback)?;
        Ok(())
    }

    async fn create_user(&self, tx: &mut SqlTransaction, user: &User) -> Result<()> {
        users::insert(tx.conn()?, user).await?;
        Ok(())
    }

    async fn update_user(&self, tx: &mut SqlTransaction, user: &User) -> Result<()> {
        let rows = users::update(tx.conn()?, user).await?;
        expect_one_row(rows, "update", &user.id)
    }

    async fn delete_user(&self, tx: &mut SqlTransaction, id: &UserId) -> Result<()> {
        let rows = users::delete(tx.conn()?, id).await?;
        expect_one_row(rows, "delete", id)
    }
}
