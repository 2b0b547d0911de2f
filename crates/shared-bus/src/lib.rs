//! # Shared Bus - In-Memory Publication Bus
//!
//! Carries immutable snapshots from a producer (the synchronization engine)
//! to any number of observers (rendering shells, loggers, tests).
//!
//! ```text
//! ┌──────────────┐    publish()     ┌──────────────┐   subscribe()   ┌──────────────┐
//! │   Producer   │ ───────────────→ │     Bus      │ ──────────────→ │  Observer N  │
//! └──────────────┘                  └──────────────┘                 └──────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - Messages reach each subscriber in publication order.
//! - A slow subscriber skips the oldest messages instead of blocking the producer.
//! - Dropping a `Subscription` unsubscribes.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use publisher::{InMemoryBus, Publisher};
pub use subscriber::{MessageFilter, MessageStream, Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before the oldest are skipped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
