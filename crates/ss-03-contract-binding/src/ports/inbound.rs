//! # Inbound Ports
//!
//! API trait defining what the Contract Binding can do.

use async_trait::async_trait;
use primitive_types::U256;
use shared_types::{Address, Amount, OperationKind};
use ss_02_provider_session::SessionState;
use std::sync::Arc;

use crate::domain::{BindingHandle, CallArg, ContractError, MethodSet, TransactionReceipt};

/// Contract Binding API - inbound port.
#[async_trait]
pub trait ContractApi: Send + Sync {
    /// Bind `methods` at `contract` to the session's account.
    fn bind(
        &self,
        session: &SessionState,
        contract: Address,
        methods: Arc<MethodSet>,
    ) -> Result<BindingHandle, ContractError>;

    /// Drop the handle. Returns true if one existed.
    fn unbind(&self) -> bool;

    /// Current handle, if bound.
    fn handle(&self) -> Option<BindingHandle>;

    /// Read-only call returning a `uint256`. Never retried.
    async fn query(&self, method: &str, args: &[CallArg]) -> Result<U256, ContractError>;

    /// Submit a transaction and wait for its confirmation.
    async fn submit(
        &self,
        kind: OperationKind,
        method: &str,
        args: &[CallArg],
        value: Option<Amount>,
    ) -> Result<TransactionReceipt, ContractError>;
}
