//! # Validation Errors
//!
//! Failures of user-entered amount strings. None of these ever reach the
//! network: the codec runs before any contract call is attempted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an amount string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Input was blank (or only whitespace).
    #[error("amount is empty")]
    EmptyInput,

    /// Input is not a plain decimal number.
    #[error("amount is not a number")]
    NotANumber,

    /// Input is a number below zero.
    #[error("amount must not be negative")]
    Negative,

    /// More fractional digits than the token has decimals.
    #[error("amount has more than {max} decimal places")]
    TooManyDecimals {
        /// Decimals supported by the token
        max: u8,
    },

    /// The scaled value does not fit in 256 bits.
    #[error("amount is too large")]
    Overflow,
}
