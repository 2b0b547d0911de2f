//! # Domain Module
//!
//! Synchronizer phases, balance snapshots, pending operations, the published
//! state composite and the unified engine error.

pub mod entities;
pub mod errors;
pub mod state;

pub use entities::*;
pub use errors::*;
pub use state::*;
