//! # Domain Module
//!
//! ABI method descriptors, binding handle, receipts and contract errors.

pub mod abi;
pub mod entities;
pub mod errors;

pub use abi::*;
pub use entities::*;
pub use errors::*;
