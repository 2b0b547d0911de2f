//! # Inbound Ports
//!
//! API trait defining what the Provider Session can do.

use async_trait::async_trait;
use shared_types::Address;

use crate::domain::{SessionError, SessionState, WalletEvent};

/// Provider Session API - inbound port.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Obtain account access, prompting the user if needed.
    async fn connect(&self) -> Result<Address, SessionError>;

    /// Connected address without suspending.
    fn current_address(&self) -> Option<Address>;

    /// Current lifecycle state.
    fn state(&self) -> SessionState;

    /// Apply an unsolicited wallet event. Returns true if the session was torn down.
    fn handle_event(&self, event: &WalletEvent) -> bool;

    /// Tear the session down. Returns true if it was not already disconnected.
    fn handle_disconnect(&self) -> bool;
}
