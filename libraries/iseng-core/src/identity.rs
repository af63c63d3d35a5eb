/// Production identity generator
use crate::error::Result;
use crate::traits::IdGenerator;
use crate::types::UserId;
use uuid::Uuid;

/// Random 128-bit (UUID v4) identifiers rendered as hyphenated text
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UuidGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UuidGenerator {
    fn generate_id(&self) -> Result<UserId> {
        Ok(UserId::new(Uuid::new_v4().hyphenated().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let generator = UuidGenerator::new();
        let ids: HashSet<UserId> = (0..1_000)
            .map(|_| generator.generate_id().unwrap())
            .collect();
        assert_eq!(ids.len(), 1_000);

        let sample = ids.iter().next().unwrap();
        assert!(Uuid::parse_str(sample.as_str()).is_ok());
    }
}
