//! WebSocket message types for server-Player communication
//!
//! `ClientMessage` is a plain serde enum. `ServerMessage` is decoded by hand
//! through [`decode_server_message`] so that an unknown `type` becomes
//! `ServerMessage::Unknown` instead of a decode failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{
    BoardPiece, ChessInfo, FailureReason, MoveEndpoint, StatePatch, XpProgress,
};

// =============================================================================
// Envelope
// =============================================================================

/// Raw `{ "type": ..., "payload": ... }` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// Failure to turn a text frame into a `ServerMessage`.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Not JSON, not an object, or no string `type`
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("envelope has an empty type tag")]
    EmptyTag,

    /// Known tag whose payload does not match the expected shape
    #[error("invalid payload for {kind}: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// Client Messages (Player → Server)
// =============================================================================

/// Intents sent by the Player. The server validates every one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    CreateGame {},
    GetGameState {},
    /// Request the chess catalog
    ListChess {},
    RefreshShop {},
    BuyChess {
        #[serde(rename = "chessName")]
        chess_name: String,
    },
    LockShop {
        locked: bool,
    },
    MoveChess {
        from: MoveEndpoint,
        to: MoveEndpoint,
    },
    SellChess {
        #[serde(rename = "unitId")]
        unit_id: String,
    },
    #[serde(rename = "BuyXP")]
    BuyXp {},
}

impl ClientMessage {
    /// Wire `type` tag of this intent.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreateGame {} => "CreateGame",
            Self::GetGameState {} => "GetGameState",
            Self::ListChess {} => "ListChess",
            Self::RefreshShop {} => "RefreshShop",
            Self::BuyChess { .. } => "BuyChess",
            Self::LockShop { .. } => "LockShop",
            Self::MoveChess { .. } => "MoveChess",
            Self::SellChess { .. } => "SellChess",
            Self::BuyXp {} => "BuyXP",
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Server Payloads
// =============================================================================

/// Result payload shared by most intents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StatePatch>,
}

impl ActionResult {
    pub fn ok(state: StatePatch) -> Self {
        Self {
            success: true,
            reason: None,
            state: Some(state),
        }
    }

    pub fn failed(reason: impl Into<FailureReason>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            state: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StatePatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListChessResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    #[serde(default)]
    pub chess: Vec<ChessInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpUpdatedNotice {
    pub xp: XpProgress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpNotice {
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<XpProgress>,
}

/// Three copies of a piece were combined into a higher star.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeNotice {
    pub chess_name: String,
    pub star: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StatePatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleNotice {
    pub in_battle: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleStartNotice {
    pub round: u32,
    /// Opponent line-up, for display only
    #[serde(default)]
    pub enemy_board: Vec<BoardPiece>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleEndNotice {
    pub round: u32,
    pub won: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StatePatch>,
}

// =============================================================================
// Server Messages (Server → Player)
// =============================================================================

macro_rules! server_messages {
    ($( $(#[$meta:meta])* $variant:ident($payload:ty) => $tag:literal, )*) => {
        /// Messages from the server, closed over the tags this client knows.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ServerMessage {
            $( $(#[$meta])* $variant($payload), )*
            /// Forward-compatible fallback for tags this client does not know
            Unknown { kind: String, payload: Value },
        }

        impl ServerMessage {
            /// Every tag that decodes into a typed variant.
            pub const KNOWN_TAGS: &'static [&'static str] = &[$($tag),*];

            /// Wire `type` tag; for `Unknown` this is the tag as received.
            pub fn tag(&self) -> &str {
                match self {
                    $( Self::$variant(_) => $tag, )*
                    Self::Unknown { kind, .. } => kind,
                }
            }

            /// Decode the payload of an already-parsed envelope.
            pub fn from_envelope(envelope: Envelope) -> Result<Self, DecodeError> {
                let Envelope { kind, payload } = envelope;
                if kind.is_empty() {
                    return Err(DecodeError::EmptyTag);
                }
                $(
                    if kind == $tag {
                        return serde_json::from_value(payload)
                            .map(Self::$variant)
                            .map_err(|source| DecodeError::Payload { kind, source });
                    }
                )*
                Ok(Self::Unknown { kind, payload })
            }

            pub fn to_envelope(&self) -> Result<Envelope, serde_json::Error> {
                let payload = match self {
                    $( Self::$variant(payload) => serde_json::to_value(payload)?, )*
                    Self::Unknown { payload, .. } => payload.clone(),
                };
                Ok(Envelope {
                    kind: self.tag().to_string(),
                    payload,
                })
            }
        }
    };
}

server_messages! {
    CreateGameResult(CreateGameResult) => "CreateGameResult",
    GetGameStateResult(ActionResult) => "GetGameStateResult",
    ListChessResult(ListChessResult) => "ListChessResult",
    RefreshShopResult(ActionResult) => "RefreshShopResult",
    BuyChessResult(ActionResult) => "BuyChessResult",
    LockShopResult(ActionResult) => "LockShopResult",
    MoveChessResult(ActionResult) => "MoveChessResult",
    SellChessResult(ActionResult) => "SellChessResult",
    BuyXpResult(ActionResult) => "BuyXPResult",
    XpUpdatedNotice(XpUpdatedNotice) => "XPUpdatedNotice",
    LevelUpNotice(LevelUpNotice) => "LevelUpNotice",
    MergeNotice(MergeNotice) => "MergeNotice",
    BattleNotice(BattleNotice) => "BattleNotice",
    /// Battle phase begins
    BattleStartNotice(BattleStartNotice) => "BattleStartNotice",
    /// Battle phase ends, back to preparation
    BattleEndNotice(BattleEndNotice) => "BattleEndNotice",
}

/// Borrowed view of any `*Result` message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultView<'a> {
    /// Tag of the intent this result answers (`"MoveChess"` for `MoveChessResult`)
    pub intent: &'static str,
    pub success: bool,
    pub reason: Option<&'a FailureReason>,
    pub state: Option<&'a StatePatch>,
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_envelope()?)
    }

    /// The result half of the protocol, or `None` for notices and unknown tags.
    pub fn as_result(&self) -> Option<ResultView<'_>> {
        fn view<'a>(intent: &'static str, result: &'a ActionResult) -> ResultView<'a> {
            ResultView {
                intent,
                success: result.success,
                reason: result.reason.as_ref(),
                state: result.state.as_ref(),
            }
        }

        Some(match self {
            Self::CreateGameResult(result) => ResultView {
                intent: "CreateGame",
                success: result.success,
                reason: result.reason.as_ref(),
                state: result.state.as_ref(),
            },
            Self::ListChessResult(result) => ResultView {
                intent: "ListChess",
                success: result.success,
                reason: result.reason.as_ref(),
                state: None,
            },
            Self::GetGameStateResult(result) => view("GetGameState", result),
            Self::RefreshShopResult(result) => view("RefreshShop", result),
            Self::BuyChessResult(result) => view("BuyChess", result),
            Self::LockShopResult(result) => view("LockShop", result),
            Self::MoveChessResult(result) => view("MoveChess", result),
            Self::SellChessResult(result) => view("SellChess", result),
            Self::BuyXpResult(result) => view("BuyXP", result),
            _ => return None,
        })
    }
}

/// Parse a text frame into a `ServerMessage`.
///
/// Total: returns an error for malformed frames, never panics, and maps
/// unrecognized tags to `ServerMessage::Unknown`.
pub fn decode_server_message(text: &str) -> Result<ServerMessage, DecodeError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
    ServerMessage::from_envelope(envelope)
}
