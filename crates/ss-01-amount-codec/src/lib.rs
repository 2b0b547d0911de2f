//! # SS-01 Amount Codec
//!
//! Exact conversion between user-entered decimal strings and the staking
//! contract's 18-decimal base unit.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Pure domain crate (no ports, no I/O)
//!
//! ## Rules
//!
//! | Input | Result |
//! |-------|--------|
//! | `""`, `"  "` | `ValidationError::EmptyInput` |
//! | `"abc"`, `"1e3"`, `"+1"` | `ValidationError::NotANumber` |
//! | `"-5"` | `ValidationError::Negative` |
//! | `"0.0000000000000000001"` | `ValidationError::TooManyDecimals` |
//! | `"10"` | `10 * 10^18` base units |
//!
//! ## Module Structure
//!
//! ```text
//! ss-01-amount-codec/
//! ├── domain/      # AmountCodec: encode / decode / format_fixed
//! └── error.rs     # ValidationError
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod error;

pub use domain::{
    decode, encode, format_fixed, AmountCodec, DEFAULT_DECIMALS, DEFAULT_DISPLAY_PRECISION,
    MAX_DECIMALS,
};
pub use error::ValidationError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
