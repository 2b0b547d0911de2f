//! # Ports Module
//!
//! Hexagonal architecture ports (inbound API, outbound wallet capability).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
