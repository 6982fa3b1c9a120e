//! Connection defaults shared by the transport and the configuration layer.

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8080/ws";

// Reconnection constants
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
