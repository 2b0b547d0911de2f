//! # Domain Entities
//!
//! Session lifecycle and the wallet events that drive it.

use serde::{Deserialize, Serialize};
use shared_types::Address;

/// Ethereum mainnet.
pub const ETHEREUM_MAINNET: u64 = 1;

/// Polygon PoS.
pub const POLYGON: u64 = 137;

/// Arbitrum One.
pub const ARBITRUM_ONE: u64 = 42161;

/// Chains the staking dApp is deployed against.
pub const SUPPORTED_CHAIN_IDS: [u64; 3] = [ETHEREUM_MAINNET, POLYGON, ARBITRUM_ONE];

/// Connection state of the user's signing account.
///
/// ```text
/// Disconnected ──connect()──→ Connecting ──success──→ Connected(addr)
///       ↑                         │                        │
///       └──────── failure ────────┘                        │
///       └──────────────── disconnect event ────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// No account.
    #[default]
    Disconnected,
    /// Waiting on the wallet prompt.
    Connecting,
    /// Account access granted.
    Connected(Address),
}

impl SessionState {
    /// Connected address, if any.
    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        match self {
            SessionState::Connected(address) => Some(address),
            _ => None,
        }
    }

    /// Address or the empty address when not connected.
    #[must_use]
    pub fn address_or_empty(&self) -> Address {
        self.address().cloned().unwrap_or_default()
    }

    /// True once account access has been granted.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }
}

/// Events emitted by the wallet outside of any request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEvent {
    /// The wallet dropped the connection.
    Disconnected,
    /// The exposed accounts changed; empty means access was revoked.
    AccountsChanged(Vec<String>),
    /// The wallet switched networks.
    ChainChanged(u64),
}
