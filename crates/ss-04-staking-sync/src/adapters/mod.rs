//! # Adapters
//!
//! Glue between the wallet's event stream and the synchronizer.

pub mod event_listener;

pub use event_listener::spawn_event_listener;
