//! Shared type definitions
//!
//! Game-state DTOs and value objects carried inside message payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Move Endpoints
// =============================================================================

/// One side of a `MoveChess` intent.
///
/// On the wire a bench slot is the token `"bench-<index>"`, the bench area as a
/// whole (server picks the slot) is the sentinel `"bench"`, and a board cell is
/// a two-element `[x, y]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEndpoint", into = "RawEndpoint")]
pub enum MoveEndpoint {
    BenchSlot(usize),
    BenchArea,
    Board { x: i32, y: i32 },
}

pub const BENCH_TOKEN: &str = "bench";

/// Token that is neither `"bench"` nor `"bench-<index>"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid move endpoint token: {0:?}")]
pub struct InvalidEndpoint(pub String);

impl MoveEndpoint {
    pub fn parse_token(token: &str) -> Result<Self, InvalidEndpoint> {
        if token == BENCH_TOKEN {
            return Ok(Self::BenchArea);
        }
        token
            .strip_prefix("bench-")
            .and_then(|index| index.parse::<usize>().ok())
            .map(Self::BenchSlot)
            .ok_or_else(|| InvalidEndpoint(token.to_string()))
    }
}

impl fmt::Display for MoveEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BenchSlot(index) => write!(f, "{BENCH_TOKEN}-{index}"),
            Self::BenchArea => f.write_str(BENCH_TOKEN),
            Self::Board { x, y } => write!(f, "[{x}, {y}]"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEndpoint {
    Token(String),
    Pair([i32; 2]),
}

impl TryFrom<RawEndpoint> for MoveEndpoint {
    type Error = InvalidEndpoint;

    fn try_from(raw: RawEndpoint) -> Result<Self, Self::Error> {
        match raw {
            RawEndpoint::Token(token) => Self::parse_token(&token),
            RawEndpoint::Pair([x, y]) => Ok(Self::Board { x, y }),
        }
    }
}

impl From<MoveEndpoint> for RawEndpoint {
    fn from(endpoint: MoveEndpoint) -> Self {
        match endpoint {
            MoveEndpoint::Board { x, y } => RawEndpoint::Pair([x, y]),
            token => RawEndpoint::Token(token.to_string()),
        }
    }
}

// =============================================================================
// Failure Reasons
// =============================================================================

/// Why the server rejected an intent.
///
/// The server draws from a small fixed vocabulary; anything else is kept
/// verbatim in `Other` so newer servers never break older clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FailureReason {
    NotEnoughMoney,
    BenchFull,
    InvalidMove,
    BoardFull,
    GameNotFound,
    Other(String),
}

impl FailureReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotEnoughMoney => "not enough money",
            Self::BenchFull => "bench full",
            Self::InvalidMove => "invalid move",
            Self::BoardFull => "board is full",
            Self::GameNotFound => "game not found",
            Self::Other(reason) => reason,
        }
    }
}

impl From<String> for FailureReason {
    fn from(reason: String) -> Self {
        match reason.as_str() {
            "not enough money" => Self::NotEnoughMoney,
            "bench full" => Self::BenchFull,
            "invalid move" => Self::InvalidMove,
            "board is full" => Self::BoardFull,
            "game not found" => Self::GameNotFound,
            _ => Self::Other(reason),
        }
    }
}

impl From<&str> for FailureReason {
    fn from(reason: &str) -> Self {
        Self::from(reason.to_string())
    }
}

impl From<FailureReason> for String {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::Other(reason) => reason,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Game State DTOs
// =============================================================================

/// A piece owned by the player, on the bench or on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChessPiece {
    /// Server-assigned unit id (used by `SellChess`)
    pub id: String,
    pub name: String,
    #[serde(default = "default_star")]
    pub star: u8,
    #[serde(default)]
    pub cost: u32,
}

fn default_star() -> u8 {
    1
}

/// A piece placed on the board at a server grid index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPiece {
    #[serde(flatten)]
    pub piece: ChessPiece,
    pub position: [i32; 2],
}

/// A purchasable offer in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSlot {
    pub chess_name: String,
    pub cost: u32,
}

/// Trait bonus progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Synergy {
    pub name: String,
    pub count: u32,
    #[serde(default)]
    pub thresholds: Vec<u32>,
    #[serde(default)]
    pub active_level: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpProgress {
    pub current: u32,
    pub required: u32,
}

/// Catalog entry returned by `ListChess` (static game content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChessInfo {
    pub name: String,
    pub cost: u32,
    #[serde(default)]
    pub traits: Vec<String>,
}

/// Partial game state. Absent fields are left untouched by the receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<XpProgress>,
    /// Empty (sold out) slots are `null`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<Vec<Option<ShopSlot>>>,
    /// Empty bench slots are `null`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bench: Option<Vec<Option<ChessPiece>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<Vec<BoardPiece>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synergies: Option<Vec<Synergy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_battle: Option<bool>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_wire_shapes() {
        assert_eq!(
            serde_json::to_value(MoveEndpoint::BenchSlot(4)).expect("serialize"),
            json!("bench-4")
        );
        assert_eq!(
            serde_json::to_value(MoveEndpoint::BenchArea).expect("serialize"),
            json!("bench")
        );
        assert_eq!(
            serde_json::to_value(MoveEndpoint::Board { x: 3, y: 1 }).expect("serialize"),
            json!([3, 1])
        );
    }

    #[test]
    fn test_endpoint_rejects_garbage_tokens() {
        assert!(MoveEndpoint::parse_token("bench-").is_err());
        assert!(MoveEndpoint::parse_token("bench--1").is_err());
        assert!(MoveEndpoint::parse_token("board").is_err());
        assert!(serde_json::from_value::<MoveEndpoint>(json!([1, 2, 3])).is_err());
        assert_eq!(
            serde_json::from_value::<MoveEndpoint>(json!("bench-12")).expect("deserialize"),
            MoveEndpoint::BenchSlot(12)
        );
    }

    #[test]
    fn test_failure_reason_vocabulary() {
        assert_eq!(FailureReason::from("bench full"), FailureReason::BenchFull);
        assert_eq!(FailureReason::from("board is full"), FailureReason::BoardFull);
        assert_eq!(
            FailureReason::from("round is over"),
            FailureReason::Other("round is over".into())
        );
        let encoded = serde_json::to_value(FailureReason::NotEnoughMoney).expect("serialize");
        assert_eq!(encoded, json!("not enough money"));
    }

    #[test]
    fn test_state_patch_skips_absent_fields() {
        let patch = StatePatch {
            money: Some(7),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).expect("serialize"),
            json!({ "money": 7 })
        );
        let parsed: StatePatch =
            serde_json::from_value(json!({ "inBattle": true, "bench": [null, {"id": "u1", "name": "Archer"}] }))
                .expect("deserialize");
        assert_eq!(parsed.in_battle, Some(true));
        let bench = parsed.bench.expect("bench present");
        assert_eq!(bench.len(), 2);
        assert_eq!(bench[1].as_ref().map(|p| p.star), Some(1));
    }
}
