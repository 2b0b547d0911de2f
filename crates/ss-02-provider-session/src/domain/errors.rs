//! # Domain Errors
//!
//! Wallet connection failures.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session error types.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionError {
    /// The host exposes no wallet capability.
    #[error("No wallet detected")]
    NoWalletDetected,

    /// The user declined the account access prompt.
    #[error("User rejected the connection request")]
    UserRejected,

    /// Access was granted but the wallet returned no account.
    #[error("Wallet returned no account")]
    NoAccountReturned,

    /// A connection attempt is already waiting on the wallet.
    #[error("Connection already in progress")]
    ConnectInProgress,

    /// The wallet is on a chain the engine is not configured for.
    #[error("Unsupported chain id {chain_id}")]
    UnsupportedChain {
        /// Chain id reported by the wallet
        chain_id: u64,
    },

    /// The session was torn down while the connection attempt was pending.
    #[error("Connection interrupted by a wallet disconnect")]
    Interrupted,

    /// Any other wallet failure.
    #[error("Wallet provider error: {0}")]
    Provider(String),
}
