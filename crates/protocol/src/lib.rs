//! HexChess Protocol - Wire types shared by the game server and the Player client
//!
//! Every message on the socket is a JSON envelope:
//!
//! ```json
//! { "type": "MoveChess", "payload": { "from": "bench-0", "to": [3, 1] } }
//! ```
//!
//! This crate contains:
//! - `ClientMessage`: intents sent by the Player
//! - `ServerMessage`: results and notices sent by the server, with an `Unknown`
//!   fallback for forward compatibility
//! - Snapshot DTOs the server uses to describe game state
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Total decoding** - Decoding never panics; unknown tags are data, not errors

pub mod messages;
pub mod types;

pub use messages::{
    decode_server_message, ActionResult, BattleEndNotice, BattleNotice, BattleStartNotice,
    ClientMessage, CreateGameResult, DecodeError, Envelope, LevelUpNotice, ListChessResult,
    MergeNotice, ResultView, ServerMessage, XpUpdatedNotice,
};
pub use types::{
    BoardPiece, ChessInfo, ChessPiece, FailureReason, InvalidEndpoint, MoveEndpoint, ShopSlot,
    StatePatch, Synergy, XpProgress,
};
