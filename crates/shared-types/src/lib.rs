//! # Shared Types Crate
//!
//! Domain entities shared by every Stake-Sync subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem value types are defined here.
//! - **Exact Arithmetic**: amounts are `U256` base units, never floating point.
//! - **Normalized Identity**: addresses compare case-insensitively by construction.

pub mod entities;

pub use entities::*;
