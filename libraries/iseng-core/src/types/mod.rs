/// Domain types for Iseng
mod ids;
mod request;
mod user;

pub use ids::UserId;
pub use request::{
    CreateUserRequest, ListUserRequest, UpdateUserRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
pub use user::{User, UserPage};
