//! # Synchronizer Configuration
//!
//! Every knob the engine exposes, with defaults matching the deployed dApp.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `SS_CONTRACT_ADDRESS` | `contract_address` | deployed staking contract |
//! | `SS_ALLOWED_CHAINS` | `allowed_chain_ids` | `1,137,42161` |
//! | `SS_DECIMALS` | `decimals` | `18` |
//! | `SS_DISPLAY_PRECISION` | `display_precision` | `5` |
//! | `SS_BUS_CAPACITY` | `bus_capacity` | `1000` |
//! | `SS_REPROMPT_ON_CONNECT` | `reprompt_on_connect` | `false` |
//! | `SS_CONFIRMATION_TIMEOUT_MS` | `confirmation_timeout_ms` | unset |

use serde::{Deserialize, Serialize};
use shared_types::Address;
use ss_01_amount_codec::{AmountCodec, DEFAULT_DECIMALS, DEFAULT_DISPLAY_PRECISION, MAX_DECIMALS};
use ss_02_provider_session::{SessionConfig, SUPPORTED_CHAIN_IDS};
use ss_03_contract_binding::BindingConfig;
use std::env;
use thiserror::Error;

/// Address of the deployed staking contract.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x658836315be349a2DfE42dE848F46bAD3aE0836f";

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The contract address is not `0x` followed by up to 40 hex digits.
    #[error("Invalid contract address: {0}")]
    InvalidContractAddress(String),

    /// The token scale does not fit in 256 bits.
    #[error("Unsupported decimals {decimals} (max {max})")]
    UnsupportedDecimals {
        /// Requested decimals
        decimals: u8,
        /// Largest supported value
        max: u8,
    },

    /// The publication bus needs room for at least one state.
    #[error("Bus capacity must be positive")]
    ZeroBusCapacity,
}

/// Staking synchronizer configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Staking contract address.
    pub contract_address: String,

    /// Chains a session may live on. Empty accepts any chain.
    pub allowed_chain_ids: Vec<u64>,

    /// Fractional digits of the staking token.
    pub decimals: u8,

    /// Fractional digits shown for balances.
    pub display_precision: usize,

    /// States buffered per subscriber before the oldest are skipped.
    pub bus_capacity: usize,

    /// Prompt the wallet on every `connect()`.
    pub reprompt_on_connect: bool,

    /// Confirmation timeout in milliseconds; `None` waits indefinitely.
    pub confirmation_timeout_ms: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            allowed_chain_ids: SUPPORTED_CHAIN_IDS.to_vec(),
            decimals: DEFAULT_DECIMALS,
            display_precision: DEFAULT_DISPLAY_PRECISION,
            bus_capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            reprompt_on_connect: false,
            confirmation_timeout_ms: None,
        }
    }
}

impl SyncConfig {
    /// Read overrides from `SS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read overrides through `lookup`; unparsable values keep their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            contract_address: lookup("SS_CONTRACT_ADDRESS").unwrap_or(defaults.contract_address),

            allowed_chain_ids: lookup("SS_ALLOWED_CHAINS")
                .map(|v| {
                    v.split(',')
                        .filter_map(|id| id.trim().parse().ok())
                        .collect()
                })
                .unwrap_or(defaults.allowed_chain_ids),

            decimals: lookup("SS_DECIMALS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.decimals),

            display_precision: lookup("SS_DISPLAY_PRECISION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.display_precision),

            bus_capacity: lookup("SS_BUS_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bus_capacity),

            reprompt_on_connect: lookup("SS_REPROMPT_ON_CONNECT")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.reprompt_on_connect),

            confirmation_timeout_ms: lookup("SS_CONFIRMATION_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .or(defaults.confirmation_timeout_ms),
        }
    }

    /// Any chain, small bus, bounded confirmation wait.
    pub fn for_testing() -> Self {
        Self {
            allowed_chain_ids: Vec::new(),
            bus_capacity: 256,
            confirmation_timeout_ms: Some(5_000),
            ..Self::default()
        }
    }

    /// Check the values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.contract()?;
        self.codec()?;
        if self.bus_capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        Ok(())
    }

    /// Normalized contract address.
    pub fn contract(&self) -> Result<Address, ConfigError> {
        let address = Address::new(&self.contract_address);
        address
            .to_word()
            .map(|_| address.clone())
            .ok_or_else(|| ConfigError::InvalidContractAddress(self.contract_address.clone()))
    }

    /// Codec for the configured token scale.
    pub fn codec(&self) -> Result<AmountCodec, ConfigError> {
        AmountCodec::new(self.decimals).ok_or(ConfigError::UnsupportedDecimals {
            decimals: self.decimals,
            max: MAX_DECIMALS,
        })
    }

    /// Provider session slice.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            allowed_chain_ids: self.allowed_chain_ids.clone(),
            reprompt_on_connect: self.reprompt_on_connect,
        }
    }

    /// Contract binding slice.
    pub fn binding(&self) -> BindingConfig {
        BindingConfig {
            confirmation_timeout_ms: self.confirmation_timeout_ms,
        }
    }
}
