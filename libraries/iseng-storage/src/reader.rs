use crate::users;
use async_trait::async_trait;
use iseng_core::{IsengError, ListUserRequest, Result, User, UserId, UserReader};
use sqlx::SqlitePool;

/// [`UserReader`] backed by a (typically read-only) `SQLite` pool
#[derive(Debug, Clone)]
pub struct SqlUserReader {
    pool: SqlitePool,
}

impl SqlUserReader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserReader for SqlUserReader {
    async fn detail_user(&self, id: &UserId) -> Result<User> {
        users::get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| IsengError::not_found("User", id.as_str()))
    }

    async fn list_users(&self, filter: &ListUserRequest) -> Result<Vec<User>> {
        Ok(users::list(&self.pool, filter).await?)
    }

    async fn count_users(&self, filter: &ListUserRequest) -> Result<u64> {
        Ok(users::count(&self.pool, filter).await?)
    }
}
