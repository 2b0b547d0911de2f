//! # Outbound Ports
//!
//! The wallet capability the host environment provides (an injected
//! EIP-1193 provider in a browser).

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, Semaphore};

use crate::domain::{SessionError, WalletEvent, ETHEREUM_MAINNET};

/// Failures reported by the wallet itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The user dismissed or declined the prompt.
    #[error("user rejected the request")]
    UserRejected,

    /// Anything else the wallet reports.
    #[error("{0}")]
    Other(String),
}

impl From<WalletError> for SessionError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::UserRejected => SessionError::UserRejected,
            WalletError::Other(msg) => SessionError::Provider(msg),
        }
    }
}

/// Wallet capability - outbound port.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access. May show a permission prompt and wait on it
    /// indefinitely.
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Chain the wallet is currently connected to.
    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Subscribe to unsolicited wallet events.
    fn events(&self) -> broadcast::Receiver<WalletEvent>;

    /// Wallet name (for logging/debugging).
    fn name(&self) -> &str;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Scripted wallet for tests and local development.
pub struct MockWallet {
    /// Wallet identifier.
    id: String,
    /// Accounts returned on approval.
    accounts: Mutex<Vec<String>>,
    /// Decline every prompt?
    reject: AtomicBool,
    /// Fail every request with a provider error?
    fail: AtomicBool,
    /// Reported chain id.
    chain_id: AtomicU64,
    /// Number of prompts shown.
    prompts: AtomicUsize,
    /// When set, each prompt waits for one permit.
    gate: Mutex<Option<Arc<Semaphore>>>,
    /// Event channel.
    events: broadcast::Sender<WalletEvent>,
}

impl Default for MockWallet {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            id: "mock-wallet".to_string(),
            accounts: Mutex::new(Vec::new()),
            reject: AtomicBool::new(false),
            fail: AtomicBool::new(false),
            chain_id: AtomicU64::new(ETHEREUM_MAINNET),
            prompts: AtomicUsize::new(0),
            gate: Mutex::new(None),
            events,
        }
    }
}

impl MockWallet {
    /// Wallet that approves with a single account.
    pub fn with_account(address: &str) -> Self {
        let wallet = Self::default();
        wallet.set_accounts(vec![address.to_string()]);
        wallet
    }

    /// Replace the accounts returned on approval.
    pub fn set_accounts(&self, accounts: Vec<String>) {
        *self.accounts.lock() = accounts;
    }

    /// Decline (or stop declining) every prompt.
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Fail (or stop failing) every request with a provider error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Report a different chain.
    pub fn set_chain_id(&self, chain_id: u64) {
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Number of prompts shown so far.
    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }

    /// Make prompts wait until `release_prompt` is called.
    pub fn hold_prompts(&self) {
        *self.gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let one held prompt complete.
    pub fn release_prompt(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(1);
        }
    }

    /// Emit an unsolicited wallet event. Returns the number of listeners.
    pub fn emit(&self, event: WalletEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        self.prompts.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| WalletError::Other("prompt gate closed".to_string()))?;
            permit.forget();
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(WalletError::Other("Mock failure".to_string()));
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(WalletError::UserRejected);
        }
        Ok(self.accounts.lock().clone())
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(WalletError::Other("Mock failure".to_string()));
        }
        Ok(self.chain_id.load(Ordering::SeqCst))
    }

    fn events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    fn name(&self) -> &str {
        &self.id
    }
}
