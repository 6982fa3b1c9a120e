//! WebSocket transport for the game server connection
//!
//! - `core`: runtime-agnostic `Transport`/`Link` seam and the retry budget
//! - `desktop`: tokio-tungstenite based transport
//! - `shared`: connection defaults

mod core;
mod desktop;
mod shared;

pub use self::core::{Link, RetryState, Transport, TransportError};
pub use desktop::{WebSocketLink, WebSocketTransport};
pub use shared::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_SERVER_URL};
