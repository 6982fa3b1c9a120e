//! Platform-agnostic core of the server connection.
//!
//! This is deliberately free of any socket library. The connection manager
//! talks to the network only through [`Transport`] and [`Link`], and keeps its
//! retry budget in [`RetryState`].

use std::time::Duration;

use async_trait::async_trait;

/// Failure inside the transport itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open {url}: {reason}")]
    Open { url: String, reason: String },

    #[error("link is closed")]
    Closed,

    #[error("socket error: {0}")]
    Socket(String),
}

/// Opens links to the server.
///
/// Futures are not required to be `Send`: the whole client runs on a single
/// event-loop thread.
#[async_trait(?Send)]
pub trait Transport {
    type Link: Link;

    /// Suspends until the link is open or has failed.
    async fn open(&mut self, url: &str) -> Result<Self::Link, TransportError>;
}

/// One open, bidirectional text channel.
#[async_trait(?Send)]
pub trait Link {
    /// Hand a frame to the socket without waiting for it to be written.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Next inbound text frame. `None` once the peer has closed the link.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Start a graceful close. Safe to call more than once.
    fn close(&mut self);
}

/// Bounded retry budget with a fixed delay.
///
/// Counts consecutive unexpected closes (including failed reconnect
/// attempts). A reconnect is scheduled while the count stays below the
/// maximum; reaching it exhausts the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl RetryState {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            delay,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Record one unexpected close.
    ///
    /// Returns the delay to wait before reconnecting, or `None` once the
    /// budget is exhausted.
    pub fn record_close(&mut self) -> Option<Duration> {
        self.attempts = self.attempts.saturating_add(1);
        if self.is_exhausted() {
            None
        } else {
            Some(self.delay)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget() {
        let mut retry = RetryState::new(3, Duration::from_millis(500));
        assert_eq!(retry.record_close(), Some(Duration::from_millis(500)));
        assert_eq!(retry.record_close(), Some(Duration::from_millis(500)));
        assert_eq!(retry.record_close(), None);
        assert!(retry.is_exhausted());
        assert_eq!(retry.record_close(), None);

        retry.reset();
        assert_eq!(retry.attempts(), 0);
        assert!(!retry.is_exhausted());
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let mut retry = RetryState::new(0, Duration::from_secs(1));
        assert!(retry.is_exhausted());
        assert_eq!(retry.record_close(), None);
    }
}
