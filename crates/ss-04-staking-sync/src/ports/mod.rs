//! # Ports Module
//!
//! The inbound `StakingApi` the rendering shell calls. Outbound ports are the
//! wallet and contract capabilities of subsystems 02 and 03.

pub mod inbound;

pub use inbound::*;
pub use ss_02_provider_session::WalletProvider;
pub use ss_03_contract_binding::ContractProvider;
