//! Iseng Core
//!
//! Storage-agnostic domain types, capability traits and the user use case.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `UserId` and the request value objects
//! - **Capability Traits**: `IdGenerator`, `UserReader`, `UserWriter`
//! - **Transaction Discipline**: `TransactionScope`, guaranteed rollback on every exit path
//! - **Use Case**: `UserService`, the create/detail/list/update/delete orchestrator
//! - **Error Handling**: Unified `IsengError` and `Result` types
//!
//! # Example
//!
//! ```rust,ignore
//! use iseng_core::testing::{InMemoryStore, InMemoryWriter, SequenceIdGenerator};
//! use iseng_core::{CreateUserRequest, UserService, UserUsecase};
//! use std::sync::Arc;
//!
//! # async fn example() -> iseng_core::Result<()> {
//! let store = InMemoryStore::new();
//! let service = UserService::new(
//!     Arc::new(store.clone()),
//!     Arc::new(InMemoryWriter::new(store)),
//!     Arc::new(SequenceIdGenerator::new()),
//! );
//!
//! let user = service
//!     .create_user(CreateUserRequest {
//!         name: "Ann".to_string(),
//!         date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
//!     })
//!     .await?;
//! assert_eq!(user.created_at, user.updated_at);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod identity;
pub mod traits;
pub mod transaction;
pub mod types;
pub mod usecase;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use error::{IsengError, Result, WriteFailure};
pub use identity::UuidGenerator;
pub use traits::{IdGenerator, UserReader, UserWriter};
pub use transaction::{TransactionScope, TransactionState};
pub use types::{
    CreateUserRequest, ListUserRequest, UpdateUserRequest, User, UserId, UserPage,
    DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use usecase::{UserService, UserUsecase};
