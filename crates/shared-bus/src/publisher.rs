//! # Publisher
//!
//! Defines the publishing side of the bus.

use crate::subscriber::{MessageFilter, MessageStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing messages to the bus.
///
/// Publishing is synchronous so that a producer can emit while it still holds
/// the lock that ordered the message; receivers always see messages in the
/// order they were produced.
pub trait Publisher<T>: Send + Sync {
    /// Publish a message.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the message.
    fn publish(&self, message: T) -> usize;

    /// Get the total number of messages published.
    fn messages_published(&self) -> u64;
}

/// In-memory implementation of the bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// A subscriber that falls more than `capacity` messages behind skips the
/// oldest ones; it never blocks the producer.
pub struct InMemoryBus<T> {
    /// Broadcast sender for messages.
    sender: broadcast::Sender<T>,

    /// Total messages published.
    messages_published: AtomicU64,

    /// Channel capacity.
    capacity: usize,
}

impl<T: Clone + Send + 'static> InMemoryBus<T> {
    /// Create a new bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            messages_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe to every message published from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        self.subscribe_filtered(Arc::new(|_: &T| true))
    }

    /// Subscribe to messages matching a filter.
    #[must_use]
    pub fn subscribe_filtered(&self, filter: MessageFilter<T>) -> Subscription<T> {
        let receiver = self.sender.subscribe();
        debug!(
            subscribers = self.sender.receiver_count(),
            "New subscription created"
        );
        Subscription::new(receiver, filter)
    }

    /// Get a stream of every message published from now on.
    #[must_use]
    pub fn stream(&self) -> MessageStream<T> {
        self.subscribe().into_stream()
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Clone + Send + 'static> Default for InMemoryBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Publisher<T> for InMemoryBus<T> {
    fn publish(&self, message: T) -> usize {
        // Always increment counter (message was attempted)
        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(message) {
            Ok(receiver_count) => {
                trace!(receivers = receiver_count, "Message published");
                receiver_count
            }
            Err(_) => {
                // No receivers; nobody is rendering yet.
                trace!("Message dropped (no receivers)");
                0
            }
        }
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
