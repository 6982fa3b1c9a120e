//! Test support: an in-memory transport and payload fixtures.

pub mod fixtures;
mod scripted;

pub use scripted::{ScriptHandle, ScriptedLink, ScriptedTransport};
