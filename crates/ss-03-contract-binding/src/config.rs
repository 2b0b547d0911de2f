//! # Binding Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Contract binding configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Give up waiting for a receipt after this many milliseconds.
    /// `None` waits indefinitely.
    pub confirmation_timeout_ms: Option<u64>,
}

impl BindingConfig {
    /// Short timeout so stuck tests fail instead of hanging.
    pub fn for_testing() -> Self {
        Self {
            confirmation_timeout_ms: Some(5_000),
        }
    }

    /// Confirmation timeout as a `Duration`.
    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_ms.map(Duration::from_millis)
    }
}
