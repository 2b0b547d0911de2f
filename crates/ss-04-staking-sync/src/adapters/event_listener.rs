//! # Wallet Event Listener
//!
//! Forwards unsolicited wallet events (disconnect, account or chain switch)
//! to the synchronizer on a background task.

use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::StakingSynchronizer;
use crate::ports::{ContractProvider, WalletProvider};

/// Spawn a task applying wallet events to `engine`.
///
/// Returns `None` when the host has no wallet. The task stops when the
/// wallet's event channel closes or the engine is dropped.
pub fn spawn_event_listener<W, P>(engine: &Arc<StakingSynchronizer<W, P>>) -> Option<JoinHandle<()>>
where
    W: WalletProvider + 'static,
    P: ContractProvider + 'static,
{
    let mut events = engine.session().events()?;
    let weak: Weak<StakingSynchronizer<W, P>> = Arc::downgrade(engine);

    Some(tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped = skipped, "[ss-04] Wallet events dropped");
                    continue;
                }
                Err(RecvError::Closed) => {
                    debug!("[ss-04] Wallet event channel closed");
                    break;
                }
            };

            let Some(engine) = weak.upgrade() else {
                break;
            };
            if engine.handle_wallet_event(&event) {
                info!(event = ?event, "[ss-04] Session ended by wallet event");
            }
        }
    }))
}

impl<W, P> StakingSynchronizer<W, P>
where
    W: WalletProvider + 'static,
    P: ContractProvider + 'static,
{
    /// Forward wallet events to this engine. See [`spawn_event_listener`].
    pub fn spawn_event_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        spawn_event_listener(self)
    }
}
