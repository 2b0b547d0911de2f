//! # Domain Module
//!
//! Session state, wallet events and session errors.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
