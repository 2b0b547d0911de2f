//! # Adapters
//!
//! In-memory contract provider for tests and local development.

pub mod in_memory;

pub use in_memory::{InMemoryStakingContract, RecordedCall};
