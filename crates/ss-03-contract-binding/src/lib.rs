//! # SS-03 Contract Binding
//!
//! Binds the staking contract's interface to the connected account, issues
//! read queries and submits state-mutating transactions.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Hexagonal (Ports & Adapters)
//!
//! ## Guarantees
//!
//! | Operation | Guarantee |
//! |-----------|-----------|
//! | `bind` | Pure construction; fails only without a connected session |
//! | `query` | Single attempt, never retried |
//! | `submit` | At most one outstanding submission per `OperationKind` |
//! | `submit` | Returns only after the transaction is mined successfully |
//!
//! ## Module Structure
//!
//! ```text
//! ss-03-contract-binding/
//! ├── domain/
//! │   ├── abi.rs       # MethodDescriptor, MethodSet, call-data encoding
//! │   ├── entities.rs  # BindingHandle, TransactionReceipt
//! │   └── errors.rs    # ContractError
//! ├── ports/
//! │   ├── inbound      # ContractApi
//! │   └── outbound     # ContractProvider
//! ├── adapters/        # InMemoryStakingContract
//! ├── application/     # ContractBinding
//! └── config.rs        # BindingConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{InMemoryStakingContract, RecordedCall};
pub use application::ContractBinding;
pub use config::BindingConfig;
pub use domain::{
    AbiType, BindingHandle, CallArg, ContractError, MethodDescriptor, MethodSet,
    StateMutability, TransactionReceipt, BALANCES, GET_BALANCE, GET_TOTAL_STAKED_AMOUNT, STAKE,
    TOTAL_STAKED, UNSTAKE,
};
pub use ports::{CallRequest, ContractApi, ContractProvider, RemoteError, SendRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
