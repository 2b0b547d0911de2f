//! # Inbound Ports
//!
//! API trait defining what the Staking Synchronizer can do.

use async_trait::async_trait;
use shared_bus::Subscription;
use ss_03_contract_binding::TransactionReceipt;
use std::sync::Arc;

use crate::domain::{BalanceSnapshot, EngineError, ObservableState};

/// Staking Synchronizer API - inbound port.
///
/// Every failure is also recorded in the published state's `last_error`.
#[async_trait]
pub trait StakingApi: Send + Sync {
    /// Connect the wallet, bind the contract and take the first snapshot.
    async fn connect(&self) -> Result<Arc<ObservableState>, EngineError>;

    /// Stake a decimal amount; returns after confirmation and re-read.
    async fn stake(&self, amount: &str) -> Result<TransactionReceipt, EngineError>;

    /// Unstake a decimal amount; returns after confirmation and re-read.
    async fn unstake(&self, amount: &str) -> Result<TransactionReceipt, EngineError>;

    /// Re-read balances, sharing any refresh already in flight.
    async fn refresh_balances(&self) -> Result<BalanceSnapshot, EngineError>;

    /// Tear the session down. Returns true if anything changed.
    fn disconnect(&self) -> bool;

    /// Subscribe to every state published from now on.
    fn subscribe(&self) -> Subscription<Arc<ObservableState>>;

    /// Latest published state.
    fn state(&self) -> Arc<ObservableState>;
}
