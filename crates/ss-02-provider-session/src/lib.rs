//! # SS-02 Provider Session
//!
//! Owns the connection to the user's wallet: obtains account access, exposes
//! the connected address and tears the session down on wallet events.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (Ports & Adapters)
//!
//! ## Lifecycle
//!
//! | From | Trigger | To |
//! |------|---------|----|
//! | `Disconnected` | `connect()` | `Connecting` |
//! | `Connecting` | wallet approves | `Connected(addr)` |
//! | `Connecting` | reject / no account / bad chain | `Disconnected` |
//! | `Connected` | disconnect, account switch, bad chain | `Disconnected` |
//!
//! `connect()` while `Connected` returns the current address without a new
//! prompt unless `SessionConfig::reprompt_on_connect` is set.
//!
//! ## Module Structure
//!
//! ```text
//! ss-02-provider-session/
//! ├── domain/       # SessionState, WalletEvent, SessionError
//! ├── ports/
//! │   ├── inbound   # SessionApi
//! │   └── outbound  # WalletProvider, MockWallet
//! ├── application/  # ProviderSession
//! └── config.rs     # SessionConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::ProviderSession;
pub use config::SessionConfig;
pub use domain::{
    SessionError, SessionState, WalletEvent, ARBITRUM_ONE, ETHEREUM_MAINNET, POLYGON,
    SUPPORTED_CHAIN_IDS,
};
pub use ports::{MockWallet, SessionApi, WalletError, WalletProvider};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
