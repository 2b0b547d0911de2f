//! # Outbound Ports
//!
//! The remote procedure capability of the connected wallet. Transport details
//! (JSON-RPC, gas estimation, signing) stay on the other side of this trait.

use async_trait::async_trait;
use primitive_types::U256;
use shared_types::{Address, TxHash};
use thiserror::Error;

use crate::domain::{ContractError, TransactionReceipt};

/// Read-only call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Contract address.
    pub to: Address,
    /// ABI call data.
    pub data: Vec<u8>,
}

/// State-changing transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Signing account.
    pub from: Address,
    /// Contract address.
    pub to: Address,
    /// ABI call data.
    pub data: Vec<u8>,
    /// Value transferred with the call, in base units.
    pub value: U256,
}

/// Failures reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The user declined to sign.
    #[error("user rejected the request")]
    UserRejected,

    /// Execution reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// Network or node failure.
    #[error("{0}")]
    Transport(String),
}

impl RemoteError {
    /// Mapping for read calls: every failure is a remote failure.
    #[must_use]
    pub fn into_query_error(self) -> ContractError {
        ContractError::RemoteFailure(self.to_string())
    }

    /// Mapping for transactions.
    #[must_use]
    pub fn into_submit_error(self) -> ContractError {
        match self {
            RemoteError::UserRejected => ContractError::UserRejected,
            RemoteError::Reverted(reason) => ContractError::Reverted(reason),
            RemoteError::Transport(msg) => ContractError::RemoteFailure(msg),
        }
    }
}

/// Contract provider - outbound port.
#[async_trait]
pub trait ContractProvider: Send + Sync {
    /// Execute a read-only call and return the raw result.
    async fn call(&self, request: CallRequest) -> Result<Vec<u8>, RemoteError>;

    /// Sign and broadcast a transaction. Suspends while the user signs.
    async fn send(&self, request: SendRequest) -> Result<TxHash, RemoteError>;

    /// Wait until the transaction is mined. Unbounded.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, RemoteError>;
}
