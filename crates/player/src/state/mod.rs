//! Client-side mirror of server-confirmed game state.
//!
//! The mirror is written only from inbound server messages and read by
//! everything else. It is never updated from a local prediction of what an
//! intent will do.

mod mirror;

pub use mirror::{GameSnapshot, LastFailure, StateChange, StateMirror};
