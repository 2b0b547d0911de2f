//! # Session Configuration

use serde::{Deserialize, Serialize};

use crate::domain::SUPPORTED_CHAIN_IDS;

/// Provider session configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Chain ids a session may be established on. Empty accepts any chain.
    pub allowed_chain_ids: Vec<u64>,

    /// Prompt the wallet on every `connect()`, even when already connected.
    pub reprompt_on_connect: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            allowed_chain_ids: SUPPORTED_CHAIN_IDS.to_vec(),
            reprompt_on_connect: false,
        }
    }
}

impl SessionConfig {
    /// Accept any chain.
    pub fn for_testing() -> Self {
        Self {
            allowed_chain_ids: Vec::new(),
            reprompt_on_connect: false,
        }
    }

    /// Whether a session may live on `chain_id`.
    pub fn allows_chain(&self, chain_id: u64) -> bool {
        self.allowed_chain_ids.is_empty() || self.allowed_chain_ids.contains(&chain_id)
    }
}
