//! # Stake-Sync Test Suite
//!
//! Cross-subsystem tests driving the full engine against the in-memory
//! wallet and staking contract.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # End-to-end flows through ss-01..ss-04
//! └── benches/           # Codec and ABI hot paths
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ss-tests
//! cargo test -p ss-tests integration::
//! cargo bench -p ss-tests
//! ```

pub mod integration;
