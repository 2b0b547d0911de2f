//! # Observable State
//!
//! The immutable composite the engine publishes after every state-changing
//! step. Observers receive it as `Arc<ObservableState>` and never see a
//! partially updated value.

use serde::{Deserialize, Serialize};
use shared_types::{Address, OperationKind};
use ss_02_provider_session::SessionState;

use super::entities::{BalanceSnapshot, PendingOperation, SyncPhase};
use super::errors::EngineError;

/// Everything a rendering shell needs to draw the staking view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObservableState {
    /// Publication sequence number, starting at 0 for the initial state.
    pub revision: u64,
    /// Wallet connection.
    pub session: SessionState,
    /// True while a contract binding exists.
    pub bound: bool,
    /// Latest balances, absent until the first successful read.
    pub snapshot: Option<BalanceSnapshot>,
    /// Operations in flight, or just finished with their outcome.
    pub pending: Vec<PendingOperation>,
    /// Synchronizer phase.
    pub phase: SyncPhase,
    /// Most recent failure, cleared by the next success.
    pub last_error: Option<EngineError>,
}

impl ObservableState {
    /// Connected address, if any.
    #[must_use]
    pub fn address(&self) -> Option<&Address> {
        self.session.address()
    }

    /// Snapshot version, if a snapshot exists.
    #[must_use]
    pub fn version(&self) -> Option<u64> {
        self.snapshot.map(|s| s.as_of)
    }

    /// Operation of `kind` listed in this state.
    #[must_use]
    pub fn operation(&self, kind: OperationKind) -> Option<&PendingOperation> {
        self.pending.iter().find(|op| op.kind == kind)
    }

    /// True while an operation of `kind` awaits its outcome.
    #[must_use]
    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.operation(kind).is_some_and(PendingOperation::is_in_flight)
    }

    /// JSON rendering for shells that consume plain data.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
