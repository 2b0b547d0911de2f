//! # Contract Binding Service
//!
//! Issues reads and transactions against the bound staking contract.
//!
//! ## Submission flow
//!
//! ```text
//! submit(kind) ──→ validate method/args/value ──→ reserve kind
//!       │                                             │
//!       │                        AlreadyPending ←─────┤ (kind already reserved)
//!       ↓                                             ↓
//!  provider.send ──→ wait_for_receipt ──→ status check ──→ release kind
//! ```

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use shared_types::{Address, Amount, OperationKind};
use ss_02_provider_session::SessionState;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::BindingConfig;
use crate::domain::{BindingHandle, CallArg, ContractError, MethodSet, TransactionReceipt};
use crate::ports::{CallRequest, ContractApi, ContractProvider, SendRequest};

/// Kinds reserved under one binding.
type SlotSet = Arc<Mutex<HashSet<OperationKind>>>;

/// Releases a reserved operation kind when dropped.
///
/// Holds the set it was reserved in, so a submission outliving `unbind()`
/// releases its kind there and never in a later binding's set.
struct PendingSlot {
    pending: SlotSet,
    kind: OperationKind,
}

impl PendingSlot {
    fn reserve(pending: SlotSet, kind: OperationKind) -> Result<Self, ContractError> {
        if !pending.lock().insert(kind) {
            return Err(ContractError::AlreadyPending(kind));
        }
        Ok(Self { pending, kind })
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.kind);
    }
}

/// Contract Binding - owns the `BindingHandle`.
pub struct ContractBinding<P: ContractProvider> {
    /// Remote procedure capability.
    provider: Arc<P>,
    /// Configuration.
    config: BindingConfig,
    /// Current handle.
    handle: RwLock<Option<BindingHandle>>,
    /// Kinds with an outstanding submission under the current binding.
    pending: Mutex<SlotSet>,
}

impl<P: ContractProvider> ContractBinding<P> {
    /// Create an unbound binding.
    pub fn new(provider: Arc<P>, config: BindingConfig) -> Self {
        Self {
            provider,
            config,
            handle: RwLock::new(None),
            pending: Mutex::new(SlotSet::default()),
        }
    }

    /// True while a handle exists.
    pub fn is_bound(&self) -> bool {
        self.handle.read().is_some()
    }

    /// True while a submission of `kind` is outstanding.
    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.slots().lock().contains(&kind)
    }

    /// Kinds with an outstanding submission, in stable order.
    pub fn pending_kinds(&self) -> Vec<OperationKind> {
        let slots = self.slots();
        let pending = slots.lock();
        OperationKind::ALL
            .into_iter()
            .filter(|k| pending.contains(k))
            .collect()
    }

    /// The provider this binding talks to.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    fn slots(&self) -> SlotSet {
        self.pending.lock().clone()
    }

    fn current(&self) -> Result<BindingHandle, ContractError> {
        self.handle.read().clone().ok_or(ContractError::BindingNotReady)
    }

    async fn await_receipt(
        &self,
        tx_hash: shared_types::TxHash,
    ) -> Result<TransactionReceipt, ContractError> {
        let wait = self.provider.wait_for_receipt(tx_hash);
        let receipt = match self.config.confirmation_timeout() {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                ContractError::ConfirmationTimeout {
                    after_ms: self.config.confirmation_timeout_ms.unwrap_or_default(),
                }
            })?,
            None => wait.await,
        };
        receipt.map_err(|e| e.into_submit_error())
    }
}

#[async_trait]
impl<P: ContractProvider + 'static> ContractApi for ContractBinding<P> {
    fn bind(
        &self,
        session: &SessionState,
        contract: Address,
        methods: Arc<MethodSet>,
    ) -> Result<BindingHandle, ContractError> {
        let signer = session
            .address()
            .cloned()
            .ok_or(ContractError::SessionNotConnected)?;

        let handle = BindingHandle::new(contract, signer, methods);
        info!(
            contract = %handle.contract(),
            signer = %handle.signer(),
            "[ss-03] Contract bound"
        );
        *self.handle.write() = Some(handle.clone());
        Ok(handle)
    }

    fn unbind(&self) -> bool {
        let was_bound = self.handle.write().take().is_some();
        // Submissions still in flight keep the old set
        *self.pending.lock() = SlotSet::default();
        if was_bound {
            debug!("[ss-03] Contract unbound");
        }
        was_bound
    }

    fn handle(&self) -> Option<BindingHandle> {
        self.handle.read().clone()
    }

    async fn query(&self, method: &str, args: &[CallArg]) -> Result<U256, ContractError> {
        let handle = self.current()?;
        let descriptor = handle
            .method(method)
            .ok_or_else(|| ContractError::UnknownMethod(method.to_string()))?;
        if !descriptor.is_read_only() {
            return Err(ContractError::MutatingMethod(method.to_string()));
        }

        let request = CallRequest {
            to: handle.contract().clone(),
            data: descriptor.encode_call(args)?,
        };
        let raw = self.provider.call(request).await.map_err(|e| {
            warn!(method = method, error = %e, "[ss-03] Read failed");
            e.into_query_error()
        })?;

        descriptor.decode_uint(&raw)
    }

    async fn submit(
        &self,
        kind: OperationKind,
        method: &str,
        args: &[CallArg],
        value: Option<Amount>,
    ) -> Result<TransactionReceipt, ContractError> {
        let handle = self.current()?;
        let descriptor = handle
            .method(method)
            .ok_or_else(|| ContractError::UnknownMethod(method.to_string()))?;
        if descriptor.is_read_only() {
            return Err(ContractError::ReadOnlyMethod(method.to_string()));
        }
        let value = value.unwrap_or_default();
        if !value.is_zero() && !descriptor.is_payable() {
            return Err(ContractError::NotPayable(method.to_string()));
        }
        let data = descriptor.encode_call(args)?;

        let _slot = PendingSlot::reserve(self.slots(), kind)?;

        let request = SendRequest {
            from: handle.signer().clone(),
            to: handle.contract().clone(),
            data,
            value: value.base_units(),
        };
        let tx_hash = self.provider.send(request).await.map_err(|e| {
            warn!(kind = %kind, error = %e, "[ss-03] Submission failed");
            e.into_submit_error()
        })?;
        debug!(kind = %kind, tx = ?tx_hash, "[ss-03] Transaction sent, awaiting confirmation");

        let receipt = self.await_receipt(tx_hash).await?;
        if !receipt.success {
            warn!(kind = %kind, tx = ?tx_hash, "[ss-03] Transaction reverted");
            return Err(ContractError::Reverted(format!(
                "transaction {tx_hash:?} failed in block {}",
                receipt.block_number
            )));
        }

        info!(
            kind = %kind,
            tx = ?tx_hash,
            block = receipt.block_number,
            "[ss-03] Transaction confirmed"
        );
        Ok(receipt)
    }
}
