//! # Domain Errors
//!
//! Failures of contract reads and transactions.

use serde::{Deserialize, Serialize};
use shared_types::OperationKind;
use thiserror::Error;

/// Contract binding error types.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ContractError {
    /// Binding requires a connected session.
    #[error("Session is not connected")]
    SessionNotConnected,

    /// No binding handle exists.
    #[error("Contract binding not ready")]
    BindingNotReady,

    /// The method is not part of the bound interface.
    #[error("Unknown contract method: {0}")]
    UnknownMethod(String),

    /// Arguments do not match the method's inputs.
    #[error("Invalid arguments for {method}: {reason}")]
    InvalidArguments {
        /// Method name
        method: String,
        /// What did not match
        reason: String,
    },

    /// Value attached to a method that cannot receive it.
    #[error("Method {0} is not payable")]
    NotPayable(String),

    /// A view method was submitted as a transaction.
    #[error("Method {0} is read-only and cannot be submitted")]
    ReadOnlyMethod(String),

    /// A state-changing method was issued as a read.
    #[error("Method {0} mutates state and cannot be queried")]
    MutatingMethod(String),

    /// The remote returned data that does not decode as the method's output.
    #[error("Malformed response from {method}: {reason}")]
    MalformedResponse {
        /// Method name
        method: String,
        /// Decoding failure
        reason: String,
    },

    /// Transport failure, or a revert during a read.
    #[error("Remote call failed: {0}")]
    RemoteFailure(String),

    /// The transaction was mined but reverted.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// The user declined to sign.
    #[error("User rejected the transaction")]
    UserRejected,

    /// A submission of this kind is already outstanding.
    #[error("A {0} operation is already pending")]
    AlreadyPending(OperationKind),

    /// No receipt arrived within the configured confirmation timeout.
    #[error("Confirmation timed out after {after_ms}ms")]
    ConfirmationTimeout {
        /// Configured timeout in milliseconds
        after_ms: u64,
    },
}

impl ContractError {
    /// Short label for metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            ContractError::SessionNotConnected => "session_not_connected",
            ContractError::BindingNotReady => "binding_not_ready",
            ContractError::UnknownMethod(_) => "unknown_method",
            ContractError::InvalidArguments { .. } => "invalid_arguments",
            ContractError::NotPayable(_) => "not_payable",
            ContractError::ReadOnlyMethod(_) => "read_only_method",
            ContractError::MutatingMethod(_) => "mutating_method",
            ContractError::MalformedResponse { .. } => "malformed_response",
            ContractError::RemoteFailure(_) => "remote_failure",
            ContractError::Reverted(_) => "reverted",
            ContractError::UserRejected => "user_rejected",
            ContractError::AlreadyPending(_) => "already_pending",
            ContractError::ConfirmationTimeout { .. } => "confirmation_timeout",
        }
    }
}
