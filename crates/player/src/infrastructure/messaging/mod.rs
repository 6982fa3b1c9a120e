//! Messaging infrastructure between the client and the game server.
//!
//! - `ConnectionManager`: link lifecycle, reconnects, inbound dispatch
//! - `SubscriptionRegistry`: message tag → callbacks
//! - `IntentSink`: outbound seam used by components that only send
//! - `EventBus`: local notifications (status changes, drag events)

pub mod command_bus;
pub mod connection;
pub mod event_bus;
pub mod subscriptions;

pub use command_bus::IntentSink;
pub use connection::{
    ConnectionError, ConnectionManager, ConnectionSettings, ConnectionStatus, Step,
};
pub use event_bus::EventBus;
pub use subscriptions::{MessageCallback, SubscriptionRegistry};

#[cfg(test)]
pub use command_bus::MockIntentSink;
