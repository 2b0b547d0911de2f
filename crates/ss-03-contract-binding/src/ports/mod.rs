//! # Ports Module
//!
//! Hexagonal architecture ports (inbound API, outbound contract provider).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
