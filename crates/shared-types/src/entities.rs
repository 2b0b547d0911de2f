//! # Core Domain Entities
//!
//! Types shared by every subsystem of the synchronization engine.
//!
//! ## Clusters
//!
//! - **Accounts**: `Address`
//! - **Value**: `Amount` (base units, 18-decimal fixed point), `U256`
//! - **Transactions**: `TxHash`, `OperationKind`

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256/H256 from primitive-types for use across all subsystems
pub use primitive_types::{H256, U256};

/// Hash of a submitted transaction.
pub type TxHash = H256;

/// Number of hex digits in a 20-byte account address.
pub const ADDRESS_HEX_LEN: usize = 40;

// =============================================================================
// CLUSTER A: ACCOUNTS
// =============================================================================

/// An account identifier as reported by the wallet.
///
/// Opaque to the engine apart from case normalization: two spellings of the
/// same checksummed address compare equal. The empty address stands for
/// "no account" and is what a disconnected session reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create a normalized address (trimmed, lower-case).
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    /// The empty address of a disconnected session.
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// True when no account is represented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Normalized textual form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Left-pad the address into a 32-byte ABI word.
    ///
    /// Returns `None` unless the address is `0x` followed by 1 to 40 hex digits.
    #[must_use]
    pub fn to_word(&self) -> Option<[u8; 32]> {
        let digits = self.0.strip_prefix("0x")?;
        if digits.is_empty()
            || digits.len() > ADDRESS_HEX_LEN
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return None;
        }

        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(padded).ok()?;

        let mut word = [0u8; 32];
        word[32 - bytes.len()..].copy_from_slice(&bytes);
        Some(word)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

// =============================================================================
// CLUSTER B: VALUE
// =============================================================================

/// A non-negative quantity in the contract's base unit (10^-18 of a token).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(U256);

impl Amount {
    /// Wrap a raw base-unit integer.
    #[must_use]
    pub fn from_base_units(units: U256) -> Self {
        Self(units)
    }

    /// Zero base units.
    #[must_use]
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// The raw base-unit integer.
    #[must_use]
    pub fn base_units(&self) -> U256 {
        self.0
    }

    /// True for zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Addition that reports overflow instead of wrapping.
    #[must_use]
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtraction that reports underflow instead of wrapping.
    #[must_use]
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl From<U256> for Amount {
    fn from(units: U256) -> Self {
        Self(units)
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Self(U256::from(units))
    }
}

// =============================================================================
// CLUSTER C: TRANSACTIONS
// =============================================================================

/// The kinds of state-mutating operation a user can start.
///
/// At most one operation of each kind is in flight at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    /// Deposit value into the staking contract.
    Stake,
    /// Withdraw previously staked value.
    Unstake,
}

impl OperationKind {
    /// All kinds, in a stable order.
    pub const ALL: [OperationKind; 2] = [OperationKind::Stake, OperationKind::Unstake];

    /// Lower-case name, used in logs and metric labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Stake => "stake",
            OperationKind::Unstake => "unstake",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
