//! Client configuration.
//!
//! Defaults are overridden by `HEXCHESS_*` environment variables. A variable
//! that is set but does not parse is an error rather than a silent fallback.

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::hex::{BoardShape, MAX_BOARD_RADIUS, MAX_BOARD_SIDE};
use crate::infrastructure::messaging::ConnectionSettings;
use crate::infrastructure::websocket::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, DEFAULT_SERVER_URL,
};

pub const DEFAULT_BENCH_SIZE: usize = 9;
pub const DEFAULT_CELL_SIZE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid {expected}: {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{var} must be a ws:// or wss:// URL: {value:?}")]
    BadUrl { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    pub auto_reconnect: bool,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub bench_size: usize,
    pub board: BoardShape,
    pub cell_size: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            auto_reconnect: true,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            bench_size: DEFAULT_BENCH_SIZE,
            board: BoardShape::STANDARD,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl ClientConfig {
    /// Read the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let server_url = match lookup("HEXCHESS_SERVER_URL") {
            Some(value) => validate_ws_url("HEXCHESS_SERVER_URL", value)?,
            None => defaults.server_url,
        };
        let auto_reconnect = parse_bool(&lookup, "HEXCHESS_AUTO_RECONNECT")?
            .unwrap_or(defaults.auto_reconnect);
        let max_retries =
            parse(&lookup, "HEXCHESS_MAX_RETRIES", "u32")?.unwrap_or(defaults.max_retries);
        let retry_delay = parse::<u64>(&lookup, "HEXCHESS_RETRY_DELAY_MS", "millisecond count")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_delay);
        let bench_size =
            parse(&lookup, "HEXCHESS_BENCH_SIZE", "usize")?.unwrap_or(defaults.bench_size);

        let radius = parse_extent(&lookup, "HEXCHESS_BOARD_RADIUS", MAX_BOARD_RADIUS)?
            .unwrap_or(defaults.board.radius().unsigned_abs());
        let side = radius
            .checked_mul(2)
            .and_then(|diameter| diameter.checked_add(1))
            .ok_or_else(|| ConfigError::Invalid {
                var: "HEXCHESS_BOARD_RADIUS",
                expected: "board radius",
                value: radius.to_string(),
            })?;
        let width = parse_extent(&lookup, "HEXCHESS_BOARD_WIDTH", MAX_BOARD_SIDE)?.unwrap_or(side);
        let height =
            parse_extent(&lookup, "HEXCHESS_BOARD_HEIGHT", MAX_BOARD_SIDE)?.unwrap_or(side);
        let board = BoardShape::new(radius, width, height).map_err(|err| ConfigError::Invalid {
            var: "HEXCHESS_BOARD_RADIUS",
            expected: "board shape",
            value: err.to_string(),
        })?;

        let cell_size = match parse::<f32>(&lookup, "HEXCHESS_CELL_SIZE", "positive number")? {
            Some(size) if !(size.is_finite() && size > 0.0) => {
                return Err(ConfigError::Invalid {
                    var: "HEXCHESS_CELL_SIZE",
                    expected: "positive number",
                    value: size.to_string(),
                });
            }
            Some(size) => size,
            None => defaults.cell_size,
        };

        Ok(Self {
            server_url,
            auto_reconnect,
            max_retries,
            retry_delay,
            bench_size,
            board,
            cell_size,
        })
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            url: self.server_url.clone(),
            auto_reconnect: self.auto_reconnect,
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
        }
    }
}

/// Load `.env.local` then `.env` from the working directory, if present.
pub fn load_dotenv() {
    for filename in [".env.local", ".env"] {
        if let Ok(path) = dotenvy::from_filename(filename) {
            tracing::debug!(path = %path.display(), "Loaded environment file");
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid {
            var,
            expected,
            value,
        })
}

/// A `u32` no larger than `max`.
fn parse_extent(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    max: u32,
) -> Result<Option<u32>, ConfigError> {
    match parse::<u32>(lookup, var, "board extent")? {
        Some(value) if value > max => Err(ConfigError::Invalid {
            var,
            expected: "board extent",
            value: value.to_string(),
        }),
        other => Ok(other),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            var,
            expected: "boolean",
            value,
        }),
    }
}

fn validate_ws_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => Ok(value.trim().to_string()),
        _ => Err(ConfigError::BadUrl { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.server_url, "ws://localhost:8080/ws");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(2_000));
        assert_eq!(config.board, BoardShape::STANDARD);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("HEXCHESS_SERVER_URL", "wss://play.example.com/ws"),
            ("HEXCHESS_AUTO_RECONNECT", "off"),
            ("HEXCHESS_MAX_RETRIES", "2"),
            ("HEXCHESS_RETRY_DELAY_MS", "250"),
            ("HEXCHESS_BOARD_RADIUS", "4"),
            ("HEXCHESS_BOARD_WIDTH", "10"),
        ]))
        .expect("config");

        assert_eq!(config.server_url, "wss://play.example.com/ws");
        assert!(!config.auto_reconnect);
        assert_eq!(config.board, BoardShape::new(4, 10, 9).expect("shape"));

        let settings = config.connection_settings();
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("HEXCHESS_MAX_RETRIES", "many")])),
            Err(ConfigError::Invalid {
                var: "HEXCHESS_MAX_RETRIES",
                ..
            })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("HEXCHESS_SERVER_URL", "http://x/ws")])),
            Err(ConfigError::BadUrl { .. })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("HEXCHESS_CELL_SIZE", "-1")])),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(ClientConfig::from_lookup(lookup(&[("HEXCHESS_AUTO_RECONNECT", "maybe")])).is_err());
    }

    #[test]
    fn test_oversized_board_is_rejected() {
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[("HEXCHESS_BOARD_RADIUS", "4000000000")])),
            Err(ConfigError::Invalid {
                var: "HEXCHESS_BOARD_RADIUS",
                expected: "board extent",
                value: "4000000000".into(),
            })
        );
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("HEXCHESS_BOARD_WIDTH", "3000000000")])),
            Err(ConfigError::Invalid {
                var: "HEXCHESS_BOARD_WIDTH",
                ..
            })
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[("HEXCHESS_BOARD_HEIGHT", "-7")])),
            Err(ConfigError::Invalid {
                var: "HEXCHESS_BOARD_HEIGHT",
                ..
            })
        ));

        let widest = MAX_BOARD_SIDE.to_string();
        let config = ClientConfig::from_lookup(lookup(&[("HEXCHESS_BOARD_WIDTH", &widest)]))
            .expect("config");
        assert_eq!(config.board.width(), 32_769);
    }
}
