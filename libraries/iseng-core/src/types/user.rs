/// User domain type
use super::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier, assigned once at creation
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Date of birth (`YYYY-MM-DD` on the wire)
    #[serde(alias = "dob")]
    pub date_of_birth: NaiveDate,

    /// Creation time, seconds since epoch
    pub created_at: i64,

    /// Last mutation time, seconds since epoch
    pub updated_at: i64,
}

/// One page of users plus the total number of users matching the same filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub count: u64,
}
