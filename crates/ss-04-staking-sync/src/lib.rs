//! # SS-04 Staking Synchronizer
//!
//! Keeps locally displayed staking balances consistent with confirmed
//! on-chain state.
//!
//! **Subsystem ID:** 04
//! **Architecture:** Hexagonal (Ports & Adapters)
//!
//! ## Data Flow
//!
//! ```text
//! shell ──connect()──→ ProviderSession ──addr──→ ContractBinding.bind
//!                                                      │
//!                          first snapshot ←── getTotalStakedAmount + getBalance
//!
//! shell ──stake("10")──→ AmountCodec ──→ ContractBinding.submit ──→ receipt
//!                                                      │
//!            ObservableState ←── publish ←── fresh refresh (two reads)
//! ```
//!
//! ## Guarantees
//!
//! | Rule | Mechanism |
//! |------|-----------|
//! | No stale balances after a confirmed transaction | fresh refresh before success |
//! | One operation per kind | `AlreadyPending` |
//! | No redundant reads | refresh coalescing |
//! | No torn reads | `Arc<ObservableState>` replaced wholesale |
//! | No zombie results after disconnect | session epoch |
//!
//! ## Module Structure
//!
//! ```text
//! ss-04-staking-sync/
//! ├── domain/
//! │   ├── entities.rs  # SyncPhase, BalanceSnapshot, PendingOperation
//! │   ├── state.rs     # ObservableState
//! │   └── errors.rs    # SyncError, EngineError
//! ├── ports/           # StakingApi
//! ├── application/     # StakingSynchronizer, refresh coalescing
//! ├── adapters/        # wallet event listener
//! └── config.rs        # SyncConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::spawn_event_listener;
pub use application::StakingSynchronizer;
pub use config::{ConfigError, SyncConfig, DEFAULT_CONTRACT_ADDRESS};
pub use domain::{
    BalanceSnapshot, EngineError, ObservableState, OperationOutcome, PendingOperation, SyncError,
    SyncPhase,
};
pub use ports::StakingApi;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
