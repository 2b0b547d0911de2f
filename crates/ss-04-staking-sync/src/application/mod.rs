//! # Application Module
//!
//! The synchronizer service and its refresh coalescing.

pub mod refresh;
pub mod service;

pub use service::StakingSynchronizer;
