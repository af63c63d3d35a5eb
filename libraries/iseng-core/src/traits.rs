/// Capability traits the user use case is built on
///
/// Each trait has one production implementation (`iseng-storage`, or
/// [`UuidGenerator`](crate::identity::UuidGenerator)) and one in-memory fake
/// behind the `testing` feature.
use crate::error::Result;
use crate::types::{ListUserRequest, User, UserId};
use async_trait::async_trait;

/// Produces globally unique user identifiers
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh identifier
    ///
    /// # Errors
    /// Returns `IsengError::Generation` if the identity source is exhausted
    fn generate_id(&self) -> Result<UserId>;
}

/// Read-only queries, possibly served by a replica lagging the writer
#[async_trait]
pub trait UserReader: Send + Sync {
    /// Get a user by ID
    ///
    /// # Errors
    /// Returns `IsengError::NotFound` if no row matches `id`
    async fn detail_user(&self, id: &UserId) -> Result<User>;

    /// Get one page of users matching the filter, in a stable order
    ///
    /// An empty page is not an error.
    async fn list_users(&self, filter: &ListUserRequest) -> Result<Vec<User>>;

    /// Count every user matching the filter, ignoring pagination
    ///
    /// Uses the same predicate as [`UserReader::list_users`].
    async fn count_users(&self, filter: &ListUserRequest) -> Result<u64>;
}

/// Transactional mutations against the primary store
///
/// Mutations never change the state of the transaction they run in; the
/// caller decides whether to commit or roll back.
#[async_trait]
pub trait UserWriter: Send + Sync {
    /// Open unit of work owned by this writer
    type Tx: Send;

    /// Open a transaction
    ///
    /// # Errors
    /// Returns `IsengError::Connection` if the primary store is unreachable
    async fn begin_transaction(&self) -> Result<Self::Tx>;

    /// Move `tx` to committed
    ///
    /// # Errors
    /// Returns `IsengError::Commit` if the store rejects the commit or `tx` is not open
    async fn commit_transaction(&self, tx: &mut Self::Tx) -> Result<()>;

    /// Move `tx` to rolled back
    ///
    /// Idempotent: a no-op when `tx` is already committed or rolled back.
    async fn rollback_transaction(&self, tx: &mut Self::Tx) -> Result<()>;

    /// Insert a new user
    async fn create_user(&self, tx: &mut Self::Tx, user: &User) -> Result<()>;

    /// Replace an existing user row
    async fn update_user(&self, tx: &mut Self::Tx, user: &User) -> Result<()>;

    /// Delete a user by ID
    async fn delete_user(&self, tx: &mut Self::Tx, id: &UserId) -> Result<()>;
}
