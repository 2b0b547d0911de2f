//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::{Address, TxHash};
use std::sync::Arc;

use super::abi::{MethodDescriptor, MethodSet};

/// A contract interface bound to the account that signs for it.
///
/// Exists only while the session is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingHandle {
    contract: Address,
    signer: Address,
    methods: Arc<MethodSet>,
}

impl BindingHandle {
    /// Pair a contract interface with a signer.
    pub fn new(contract: Address, signer: Address, methods: Arc<MethodSet>) -> Self {
        Self {
            contract,
            signer,
            methods,
        }
    }

    /// Contract address.
    #[must_use]
    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// Signing account.
    #[must_use]
    pub fn signer(&self) -> &Address {
        &self.signer
    }

    /// Bound interface.
    #[must_use]
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// Look up a bound method.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Transaction hash.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// False when execution reverted.
    pub success: bool,
}
