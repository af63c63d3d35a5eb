/// Request value objects consumed by the user use case
use super::UserId;
use crate::error::{IsengError, Result};
use chrono::NaiveDate;
use serde::Deserialize;

/// Largest page a single list call may return
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    #[serde(alias = "dob")]
    pub date_of_birth: NaiveDate,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUserRequest {
    pub id: UserId,
    pub name: String,
    pub date_of_birth: NaiveDate,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(IsengError::validation("id must not be empty"));
        }
        validate_name(&self.name)
    }
}

/// Filter and pagination for listing users
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListUserRequest {
    /// Case-insensitive substring match on the user name
    pub name: Option<String>,

    /// 1-based page number
    pub page: u32,

    /// Page size
    pub limit: u32,
}

impl Default for ListUserRequest {
    fn default() -> Self {
        Self {
            name: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ListUserRequest {
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(IsengError::validation("page starts at 1"));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(IsengError::validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }

    /// Number of rows to skip before the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// The name filter with surrounding whitespace removed, `None` when blank
    pub fn name_filter(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(IsengError::validation("name must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let req = CreateUserRequest {
            name: "   ".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        };
        assert!(matches!(req.validate(), Err(IsengError::Validation(_))));
    }

    #[test]
    fn create_request_accepts_dob_alias() {
        let req: CreateUserRequest =
            serde_json::from_str(r#"{"name":"Ann","dob":"1990-01-01"}"#).unwrap();
        assert_eq!(req.date_of_birth, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
    }

    #[test]
    fn list_request_defaults_and_offset() {
        let req = ListUserRequest::default();
        assert!(req.validate().is_ok());
        assert_eq!(req.offset(), 0);

        let third = ListUserRequest {
            page: 3,
            limit: 20,
            ..ListUserRequest::default()
        };
        assert_eq!(third.offset(), 40);
    }

    #[test]
    fn list_request_limit_bounds() {
        let zero = ListUserRequest {
            limit: 0,
            ..ListUserRequest::default()
        };
        assert!(zero.validate().is_err());

        let too_big = ListUserRequest {
            limit: MAX_PAGE_LIMIT + 1,
            ..ListUserRequest::default()
        };
        assert!(too_big.validate().is_err());

        let page_zero = ListUserRequest {
            page: 0,
            ..ListUserRequest::default()
        };
        assert!(page_zero.validate().is_err());
    }

    #[test]
    fn blank_name_filter_is_ignored() {
        let req = ListUserRequest {
            name: Some("  ".to_string()),
            ..ListUserRequest::default()
        };
        assert_eq!(req.name_filter(), None);
    }
}
