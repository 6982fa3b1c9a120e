//! Outbound side of the messaging layer.
//!
//! Components that only need to emit intents (the drag manager, the client's
//! intent helpers) depend on [`IntentSink`] instead of the whole connection,
//! so they can be exercised against a mock.

use hexchess_protocol::ClientMessage;

use super::connection::{ConnectionError, ConnectionManager};
use crate::infrastructure::websocket::Transport;

/// Something that can put an intent on the wire.
#[cfg_attr(test, mockall::automock)]
pub trait IntentSink {
    /// Fire-and-forget. Outcomes arrive later as `*Result` messages.
    fn send_intent(&mut self, intent: &ClientMessage) -> Result<(), ConnectionError>;
}

impl<T: Transport> IntentSink for ConnectionManager<T> {
    fn send_intent(&mut self, intent: &ClientMessage) -> Result<(), ConnectionError> {
        self.send(intent)
    }
}
