//! # Domain Entities

use serde::{Deserialize, Serialize};
use shared_types::{Amount, OperationKind};
use ss_01_amount_codec::AmountCodec;
use std::fmt;

/// Synchronizer lifecycle phase.
///
/// ```text
/// Idle ──connect()──→ Initializing ──→ Ready ⇄ Submitting(kind)
///  ↑                       │             ⇅
///  └──── failure ──────────┘          Refreshing
///  └──────────── disconnect (from any phase) ────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncPhase {
    /// No session, no binding.
    #[default]
    Idle,
    /// Connecting, binding and taking the first snapshot.
    Initializing,
    /// Bound with a current snapshot.
    Ready,
    /// A transaction of this kind awaits confirmation.
    Submitting(OperationKind),
    /// Balances are being re-read.
    Refreshing,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPhase::Idle => f.write_str("idle"),
            SyncPhase::Initializing => f.write_str("initializing"),
            SyncPhase::Ready => f.write_str("ready"),
            SyncPhase::Submitting(kind) => write!(f, "submitting({kind})"),
            SyncPhase::Refreshing => f.write_str("refreshing"),
        }
    }
}

/// Contract balances as of one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Total staked across all accounts.
    pub total_staked: Amount,
    /// Staked by the connected account.
    pub user_staked: Amount,
    /// Monotonic snapshot version.
    pub as_of: u64,
}

impl BalanceSnapshot {
    /// Render both figures with `places` fractional digits.
    #[must_use]
    pub fn display(&self, codec: &AmountCodec, places: usize) -> (String, String) {
        (
            codec.format_fixed(self.total_staked, places),
            codec.format_fixed(self.user_staked, places),
        )
    }
}

/// How a pending operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationOutcome {
    /// Mined successfully and balances re-read.
    Confirmed,
    /// Rejected, reverted or failed in transport.
    Failed(String),
}

/// A user-initiated stake or unstake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Operation kind.
    pub kind: OperationKind,
    /// Requested amount.
    pub amount: Amount,
    /// `None` while in flight.
    pub outcome: Option<OperationOutcome>,
}

impl PendingOperation {
    /// New in-flight operation.
    #[must_use]
    pub fn new(kind: OperationKind, amount: Amount) -> Self {
        Self {
            kind,
            amount,
            outcome: None,
        }
    }

    /// True until an outcome is recorded.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.outcome.is_none()
    }
}
