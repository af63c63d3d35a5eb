/// ID types for Iseng entities
use serde::{Deserialize, Serialize};
use std::fmt;

/// User identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_from_string() {
        let id = UserId::new("user-123");
        assert_eq!(id.as_str(), "user-123");
        assert!(!id.is_empty());
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::new("user-456");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-456\"");
        assert_eq!(format!("{}", id), "user-456");
    }
}
