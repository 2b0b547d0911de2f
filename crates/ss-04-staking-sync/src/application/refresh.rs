//! # Refresh Coalescing
//!
//! Refreshes are numbered by generation. A caller that arrives while
//! generation `g` is running is satisfied once `g` completes; a caller that
//! arrives while nothing runs needs generation `g + 1`.
//!
//! Callers serialize on an async mutex and then ask the tracker whether the
//! generation they need has already completed. Both live in a
//! `RefreshScope` that is replaced on teardown, so a new session never
//! queues behind reads from an ended one.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::{BalanceSnapshot, EngineError};

/// Result shared by every caller a refresh satisfies.
pub type RefreshResult = Result<BalanceSnapshot, EngineError>;

/// Generation bookkeeping for balance refreshes.
#[derive(Debug, Default)]
pub struct RefreshTracker {
    started: u64,
    completed: u64,
    in_flight: bool,
    last: Option<RefreshResult>,
}

impl RefreshTracker {
    /// Generation that satisfies a caller arriving now.
    pub fn target(&self) -> u64 {
        if self.in_flight {
            self.started
        } else {
            self.started + 1
        }
    }

    /// Result of `target` if it has already completed.
    pub fn completed(&self, target: u64) -> Option<RefreshResult> {
        if self.completed >= target {
            self.last.clone()
        } else {
            None
        }
    }

    /// Start a new generation.
    pub fn begin(&mut self) -> u64 {
        self.started += 1;
        self.in_flight = true;
        self.started
    }

    /// Record the result of `generation`.
    pub fn finish(&mut self, generation: u64, result: RefreshResult) {
        self.completed = self.completed.max(generation);
        self.in_flight = false;
        self.last = Some(result);
    }

    /// True while a generation is running.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

/// Refresh serialization for one session.
#[derive(Clone, Default)]
pub struct RefreshScope {
    /// Serializes balance reads.
    pub lock: Arc<AsyncMutex<()>>,
    /// Generations started and completed under `lock`.
    pub tracker: Arc<Mutex<RefreshTracker>>,
}
