use crate::error::{IsengError, Result};
use crate::traits::IdGenerator;
use crate::types::UserId;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic ids (`user-000001`, `user-000002`, ...)
///
/// With a capacity set, every call past it fails with `IsengError::Generation`.
#[derive(Debug, Default)]
pub struct SequenceIdGenerator {
    issued: AtomicU64,
    capacity: Option<u64>,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator that runs dry after `capacity` ids
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            issued: AtomicU64::new(0),
            capacity: Some(capacity),
        }
    }

    /// Number of ids requested so far, including failed requests
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn generate_id(&self) -> Result<UserId> {
        let next = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(capacity) = self.capacity {
            if next > capacity {
                return Err(IsengError::generation(format!(
                    "sequence exhausted after {} ids",
                    capacity
                )));
            }
        }
        Ok(UserId::new(format!("user-{:06}", next)))
    }
}
