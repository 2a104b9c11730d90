//! Outbound matchmaking events
//!
//! Events are published by the matchmaking manager after a transaction has
//! committed; transports subscribe to them to announce joins, pops and results.

pub mod publisher;

pub use publisher::{
    BroadcastEventPublisher, EventPublisher, NoopEventPublisher, DEFAULT_EVENT_CAPACITY,
};
