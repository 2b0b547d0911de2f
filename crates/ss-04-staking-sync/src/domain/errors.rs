//! # Domain Errors
//!
//! `EngineError` unifies every failure the engine can record. All variants
//! are `Clone + PartialEq` so they can be stored in published state.

use serde::{Deserialize, Serialize};
use ss_01_amount_codec::ValidationError;
use ss_02_provider_session::SessionError;
use ss_03_contract_binding::ContractError;
use thiserror::Error;

/// Failures owned by the synchronizer itself.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SyncError {
    /// The engine has no bound contract yet.
    #[error("Engine is not ready; connect first")]
    NotReady,

    /// The session ended while the operation was in flight.
    #[error("Session ended before the operation completed")]
    SessionEnded,

    /// The transaction confirmed but the follow-up balance read failed.
    #[error("Transaction confirmed but balances could not be refreshed: {0}")]
    StaleAfterConfirmation(String),
}

/// Any failure surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
    /// Amount input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Wallet connection failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Contract read or transaction failure.
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Synchronizer lifecycle failure.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl EngineError {
    /// Metric label.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Session(_) => "session",
            EngineError::Contract(_) => "contract",
            EngineError::Sync(_) => "sync",
        }
    }

    /// True when the user declined a wallet prompt.
    #[must_use]
    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::Session(SessionError::UserRejected)
                | EngineError::Contract(ContractError::UserRejected)
        )
    }
}
