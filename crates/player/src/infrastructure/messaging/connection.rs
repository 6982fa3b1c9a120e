//! Connection lifecycle management.
//!
//! `ConnectionManager` owns the single link to the game server. It frames
//! outbound intents, decodes and dispatches inbound envelopes through the
//! [`SubscriptionRegistry`], and reconnects after unexpected closes within a
//! bounded retry budget.
//!
//! ```text
//!   Idle ──connect──▶ Connecting ──ok──▶ Open
//!                        │  ▲              │ remote close / socket error
//!                   fail │  │ delay        ▼
//!                        ▼  └─────────── Closed ──budget exhausted──▶ Failed
//! ```
//!
//! An explicit `disconnect` also moves `Open → Closed` but never schedules a
//! reconnect. `Failed` is terminal until the caller invokes `connect` again.
//!
//! The manager is driven from one event-loop thread: `step` waits for the next
//! inbound frame or the pending reconnect timer and handles exactly one of
//! them. Subscribers only ever see `&ServerMessage`; they cannot reach the
//! manager while a dispatch pass is running.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use hexchess_protocol::{decode_server_message, ClientMessage};

use super::event_bus::EventBus;
use super::subscriptions::{MessageCallback, SubscriptionRegistry};
use crate::infrastructure::websocket::{Link, RetryState, Transport, TransportError};

/// Connection state for the game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Never connected
    Idle,
    /// Opening the link, or waiting to reopen it after an unexpected close
    Connecting,
    /// Link is open; sends are accepted
    Open,
    /// Closed and not going to reconnect on its own
    Closed,
    /// Retry budget exhausted; only an explicit `connect` resumes
    Failed,
}

impl ConnectionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionStatus::Open)
    }

    /// Returns the status display text
    pub fn display_text(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Not connected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Open => "Connected",
            ConnectionStatus::Closed => "Disconnected",
            ConnectionStatus::Failed => "Connection Failed",
        }
    }
}

/// Error types for connection operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("connection is not open ({0:?})")]
    NotOpen(ConnectionStatus),

    #[error("connect failed: {0}")]
    ConnectFailed(#[source] TransportError),

    #[error("gave up reconnecting after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("failed to encode {tag}: {reason}")]
    Encode { tag: &'static str, reason: String },

    #[error("send failed: {0}")]
    Transport(#[source] TransportError),
}

/// Connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub url: String,
    pub auto_reconnect: bool,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// What a single [`ConnectionManager::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A message was decoded and handed to this many subscribers
    Dispatched { tag: String, subscribers: usize },
    /// A malformed frame was dropped
    Dropped,
    /// The link went away unexpectedly
    LinkLost,
    /// A scheduled reconnect opened the link again
    Reconnected,
    /// Nothing left to wait for (idle, closed, or failed)
    Idle,
}

pub struct ConnectionManager<T: Transport> {
    settings: ConnectionSettings,
    transport: T,
    link: Option<T::Link>,
    status: ConnectionStatus,
    retry: RetryState,
    reconnect_at: Option<Instant>,
    subscriptions: SubscriptionRegistry,
    status_listeners: EventBus<ConnectionStatus>,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, settings: ConnectionSettings) -> Self {
        let retry = RetryState::new(settings.max_retries, settings.retry_delay);
        Self {
            settings,
            transport,
            link: None,
            status: ConnectionStatus::Idle,
            retry,
            reconnect_at: None,
            subscriptions: SubscriptionRegistry::new(),
            status_listeners: EventBus::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.settings.url
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Consecutive unexpected closes since the link was last open.
    pub fn retry_count(&self) -> u32 {
        self.retry.attempts()
    }

    /// When the pending reconnect fires, if one is scheduled.
    pub fn reconnect_due(&self) -> Option<Instant> {
        self.reconnect_at
    }

    pub fn on(&mut self, tag: impl Into<String>, callback: MessageCallback) {
        self.subscriptions.on(tag, callback);
    }

    pub fn off(&mut self, tag: &str, callback: &MessageCallback) -> bool {
        self.subscriptions.off(tag, callback)
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Observe status transitions (for a status indicator).
    pub fn on_status_change(&mut self, callback: impl FnMut(&ConnectionStatus) + 'static) {
        self.status_listeners.subscribe(callback);
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            tracing::debug!(from = ?self.status, to = ?status, "Connection status changed");
            self.status = status;
            self.status_listeners.dispatch(&status);
        }
    }

    /// Open the link, suspending until it is open or has failed.
    ///
    /// Resets the retry budget on success. Also the way out of `Failed`.
    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        if self.status.is_open() {
            return Ok(());
        }
        self.set_status(ConnectionStatus::Connecting);

        let opened = self.transport.open(&self.settings.url).await;
        self.reconnect_at = None;
        match opened {
            Ok(link) => {
                self.link = Some(link);
                self.retry.reset();
                self.set_status(ConnectionStatus::Open);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", self.settings.url, e);
                self.set_status(ConnectionStatus::Closed);
                Err(ConnectionError::ConnectFailed(e))
            }
        }
    }

    /// Close the link without reconnecting. A no-op when nothing is open or pending.
    pub fn disconnect(&mut self) {
        let pending = self.reconnect_at.take().is_some();
        match self.link.take() {
            Some(mut link) => link.close(),
            None if !pending => return,
            None => {}
        }
        tracing::info!("Disconnected from {}", self.settings.url);
        self.set_status(ConnectionStatus::Closed);
    }

    /// Frame and send one intent. Fails immediately when the link is not open;
    /// nothing is queued.
    pub fn send(&mut self, message: &ClientMessage) -> Result<(), ConnectionError> {
        let status = self.status;
        if status == ConnectionStatus::Failed {
            return Err(ConnectionError::RetriesExhausted {
                attempts: self.retry.attempts(),
            });
        }
        let Some(link) = self.link.as_mut().filter(|_| status.is_open()) else {
            return Err(ConnectionError::NotOpen(status));
        };
        let text = message.encode().map_err(|e| ConnectionError::Encode {
            tag: message.tag(),
            reason: e.to_string(),
        })?;
        link.send_text(text).map_err(ConnectionError::Transport)?;
        tracing::debug!(tag = message.tag(), "Sent intent");
        Ok(())
    }

    /// Handle the next inbound frame or the pending reconnect.
    ///
    /// Cancel-safe: a pending reconnect stays scheduled until its open
    /// attempt has resolved, so a dropped `step` is retried by the next one.
    pub async fn step(&mut self) -> Step {
        if let Some(link) = self.link.as_mut() {
            let frame = link.recv().await;
            return match frame {
                Some(Ok(text)) => self.dispatch_text(&text),
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error: {}", e);
                    self.handle_unexpected_close();
                    Step::LinkLost
                }
                None => {
                    self.handle_unexpected_close();
                    Step::LinkLost
                }
            };
        }

        let Some(at) = self.reconnect_at else {
            return Step::Idle;
        };
        tokio::time::sleep_until(at).await;
        self.attempt_reconnect().await
    }

    /// Drive the connection until nothing is left to wait for.
    pub async fn run(&mut self) {
        while self.step().await != Step::Idle {}
    }

    fn dispatch_text(&mut self, text: &str) -> Step {
        match decode_server_message(text) {
            Ok(message) => {
                let subscribers = self.subscriptions.dispatch(&message);
                if subscribers == 0 {
                    tracing::debug!(tag = %message.tag(), "No subscribers for message, ignoring");
                }
                Step::Dispatched {
                    tag: message.tag().to_string(),
                    subscribers,
                }
            }
            Err(e) => {
                tracing::error!("Dropping malformed server message: {}", e);
                Step::Dropped
            }
        }
    }

    fn handle_unexpected_close(&mut self) {
        self.link = None;
        if !self.settings.auto_reconnect {
            tracing::info!("Connection lost; auto-reconnect disabled");
            self.set_status(ConnectionStatus::Closed);
            return;
        }

        match self.retry.record_close() {
            Some(delay) => {
                tracing::info!(
                    attempt = self.retry.attempts(),
                    max = self.retry.max_attempts(),
                    "Connection lost, reconnecting in {}ms",
                    delay.as_millis()
                );
                self.reconnect_at = Some(Instant::now() + delay);
                self.set_status(ConnectionStatus::Connecting);
            }
            None => {
                tracing::error!(
                    attempts = self.retry.attempts(),
                    "Max reconnection attempts reached, giving up"
                );
                self.set_status(ConnectionStatus::Closed);
                self.set_status(ConnectionStatus::Failed);
            }
        }
    }

    async fn attempt_reconnect(&mut self) -> Step {
        let opened = self.transport.open(&self.settings.url).await;
        self.reconnect_at = None;
        match opened {
            Ok(link) => {
                tracing::info!("Reconnected to {}", self.settings.url);
                self.link = Some(link);
                self.retry.reset();
                self.set_status(ConnectionStatus::Open);
                Step::Reconnected
            }
            Err(e) => {
                tracing::warn!(
                    attempt = self.retry.attempts(),
                    "Reconnection attempt failed: {}",
                    e
                );
                self.handle_unexpected_close();
                Step::LinkLost
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for ConnectionManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.settings.url)
            .field("status", &self.status)
            .field("retry", &self.retry)
            .field("reconnect_at", &self.reconnect_at)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}
