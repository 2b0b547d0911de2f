//! # Provider Session Service
//!
//! Owns the connection to the user's signing account.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Address;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::domain::{SessionError, SessionState, WalletEvent};
use crate::ports::{SessionApi, WalletProvider};

/// Provider Session - the only owner of `SessionState`.
pub struct ProviderSession<W: WalletProvider> {
    /// Wallet capability; `None` when the host has no wallet.
    wallet: Option<Arc<W>>,
    /// Configuration.
    config: SessionConfig,
    /// Lifecycle state.
    state: RwLock<SessionState>,
}

impl<W: WalletProvider> ProviderSession<W> {
    /// Create a disconnected session.
    pub fn new(wallet: Option<Arc<W>>, config: SessionConfig) -> Self {
        Self {
            wallet,
            config,
            state: RwLock::new(SessionState::Disconnected),
        }
    }

    /// Whether the host exposes a wallet at all.
    pub fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    /// Subscribe to the wallet's unsolicited events.
    pub fn events(&self) -> Option<broadcast::Receiver<WalletEvent>> {
        self.wallet.as_ref().map(|w| w.events())
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Internal: prompt the wallet and resolve the first account.
    async fn request_address(&self, wallet: &W) -> Result<Address, SessionError> {
        let accounts = wallet.request_accounts().await?;
        let first = accounts
            .iter()
            .map(|a| a.trim())
            .find(|a| !a.is_empty())
            .ok_or(SessionError::NoAccountReturned)?;

        if !self.config.allowed_chain_ids.is_empty() {
            let chain_id = wallet.chain_id().await?;
            if !self.config.allows_chain(chain_id) {
                return Err(SessionError::UnsupportedChain { chain_id });
            }
        }

        Ok(Address::new(first))
    }

    /// Internal: drop to `Disconnected`, reporting whether anything changed.
    fn teardown(&self, reason: &str) -> bool {
        let mut state = self.state.write();
        if *state == SessionState::Disconnected {
            return false;
        }
        let previous = std::mem::take(&mut *state);
        info!(
            previous = ?previous,
            reason = reason,
            "[ss-02] Session disconnected"
        );
        true
    }
}

#[async_trait]
impl<W: WalletProvider + 'static> SessionApi for ProviderSession<W> {
    async fn connect(&self) -> Result<Address, SessionError> {
        let wallet = self.wallet.as_ref().ok_or(SessionError::NoWalletDetected)?;

        {
            let mut state = self.state.write();
            match &*state {
                SessionState::Connected(address) if !self.config.reprompt_on_connect => {
                    debug!(address = %address, "[ss-02] Already connected, not prompting");
                    return Ok(address.clone());
                }
                SessionState::Connecting => return Err(SessionError::ConnectInProgress),
                _ => *state = SessionState::Connecting,
            }
        }

        debug!(wallet = wallet.name(), "[ss-02] Requesting account access");
        let result = self.request_address(wallet).await;

        let mut state = self.state.write();
        if *state != SessionState::Connecting {
            warn!("[ss-02] Session torn down while the wallet prompt was open");
            return Err(SessionError::Interrupted);
        }

        match result {
            Ok(address) => {
                info!(address = %address, "[ss-02] Wallet connected");
                *state = SessionState::Connected(address.clone());
                Ok(address)
            }
            Err(e) => {
                warn!(error = %e, "[ss-02] Wallet connection failed");
                *state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    fn current_address(&self) -> Option<Address> {
        self.state.read().address().cloned()
    }

    fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    fn handle_event(&self, event: &WalletEvent) -> bool {
        match event {
            WalletEvent::Disconnected => self.teardown("wallet disconnected"),
            WalletEvent::AccountsChanged(accounts) => {
                let next = accounts
                    .iter()
                    .map(|a| a.trim())
                    .find(|a| !a.is_empty())
                    .map(Address::new);
                match (next, self.current_address()) {
                    (None, _) => self.teardown("accounts revoked"),
                    (Some(next), Some(current)) if next != current => {
                        self.teardown("active account changed")
                    }
                    _ => false,
                }
            }
            WalletEvent::ChainChanged(chain_id) => {
                if self.config.allows_chain(*chain_id) {
                    debug!(chain_id = chain_id, "[ss-02] Chain changed to a supported chain");
                    false
                } else {
                    self.teardown("switched to an unsupported chain")
                }
            }
        }
    }

    fn handle_disconnect(&self) -> bool {
        self.teardown("requested")
    }
}
