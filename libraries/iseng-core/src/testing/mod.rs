//! In-memory fakes for the capability traits
//!
//! Enabled with the `testing` feature (and always in this crate's own tests).
//! Reader and writer share one [`InMemoryStore`]; the writer stages mutations
//! per transaction and only publishes them on commit, so tests can check that
//! nothing partial ever reaches readers.

mod generator;
mod memory;

pub use generator::SequenceIdGenerator;
pub use memory::{InMemoryStore, InMemoryTx, InMemoryWriter};
