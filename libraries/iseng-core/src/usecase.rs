/// User use case: the five user operations over reader, writer and id generator
use crate::error::Result;
use crate::traits::{IdGenerator, UserReader, UserWriter};
use crate::transaction::TransactionScope;
use crate::types::{CreateUserRequest, ListUserRequest, UpdateUserRequest, User, UserId, UserPage};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// User operations exposed to the HTTP layer
#[async_trait]
pub trait UserUsecase: Send + Sync {
    async fn create_user(&self, request: CreateUserRequest) -> Result<User>;

    async fn detail_user(&self, id: &UserId) -> Result<User>;

    async fn list_users(&self, request: &ListUserRequest) -> Result<UserPage>;

    async fn update_user(&self, request: UpdateUserRequest) -> Result<User>;

    async fn delete_user(&self, id: &UserId) -> Result<()>;
}

#[derive(Clone, Copy)]
enum Mutation<'a> {
    Create(&'a User),
    Update(&'a User),
    Delete(&'a UserId),
}

/// Stateless orchestrator; every call is a single pass with no retries
pub struct UserService<R, W, G> {
    reader: Arc<R>,
    writer: Arc<W>,
    generator: Arc<G>,
}

impl<R, W, G> UserService<R, W, G>
where
    R: UserReader,
    W: UserWriter,
    G: IdGenerator,
{
    pub fn new(reader: Arc<R>, writer: Arc<W>, generator: Arc<G>) -> Self {
        Self {
            reader,
            writer,
            generator,
        }
    }

    /// Run one mutation inside its own transaction scope
    async fn apply(&self, mutation: Mutation<'_>) -> Result<()> {
        let writer = self.writer.as_ref();
        let mut scope = TransactionScope::begin(writer).await?;

        let outcome: Result<()> = async {
            match mutation {
                Mutation::Create(user) => writer.create_user(scope.tx(), user).await?,
                Mutation::Update(user) => writer.update_user(scope.tx(), user).await?,
                Mutation::Delete(id) => writer.delete_user(scope.tx(), id).await?,
            }
            scope.commit().await
        }
        .await;

        scope.close(outcome).await
    }
}

#[async_trait]
impl<R, W, G> UserUsecase for UserService<R, W, G>
where
    R: UserReader,
    W: UserWriter,
    G: IdGenerator,
{
    async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        request.validate()?;

        let now = Utc::now().timestamp();
        let user = User {
            id: self.generator.generate_id()?,
            name: request.name,
            date_of_birth: request.date_of_birth,
            created_at: now,
            updated_at: now,
        };

        self.apply(Mutation::Create(&user)).await?;
        tracing::info!(user_id = %user.id, "User created");

        Ok(user)
    }

    async fn detail_user(&self, id: &UserId) -> Result<User> {
        self.reader.detail_user(id).await
    }

    async fn list_users(&self, request: &ListUserRequest) -> Result<UserPage> {
        request.validate()?;

        let users = self.reader.list_users(request).await?;
        let count = self.reader.count_users(request).await?;
        tracing::debug!(returned = users.len(), count, "Listed users");

        Ok(UserPage { users, count })
    }

    async fn update_user(&self, request: UpdateUserRequest) -> Result<User> {
        request.validate()?;

        // Read outside the transaction: a delete racing in between shows up
        // as a write error from the writer, not as NotFound.
        let current = self.detail_user(&request.id).await?;

        // Second resolution: keep updated_at strictly increasing within a second
        let updated_at = Utc::now().timestamp().max(current.updated_at.saturating_add(1));
        let replacement = User {
            id: current.id,
            name: request.name,
            date_of_birth: request.date_of_birth,
            created_at: current.created_at,
            updated_at,
        };

        self.apply(Mutation::Update(&replacement)).await?;
        tracing::info!(user_id = %replacement.id, "User updated");

        Ok(replacement)
    }

    async fn delete_user(&self, id: &UserId) -> Result<()> {
        self.apply(Mutation::Delete(id)).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}
