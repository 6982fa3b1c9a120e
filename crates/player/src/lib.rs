//! HexChess player client core.
//!
//! Everything between the renderer and the game server: the persistent
//! connection, the mirror of server-confirmed state, drag-drop of pieces, and
//! hex board geometry. All of it runs on one event-loop thread.

pub mod client;
pub mod config;
pub mod hex;
pub mod infrastructure;
pub mod interaction;
pub mod state;


pub use client::GameClient;
pub use config::{ClientConfig, ConfigError};
pub use hex::{BoardShape, CubeCoord, HexError, HexLayout};
pub use interaction::{DragDropManager, DragError, DragOutcome, Position};
pub use state::{GameSnapshot, LastFailure, StateChange, StateMirror};
