//! # Domain Module
//!
//! Fixed-point conversion between decimal strings and base units.

pub mod codec;

pub use codec::*;
