//! Pointer-driven interaction: turning drag gestures into move intents.

mod drag;
mod position;

pub use drag::{DragDropManager, DragEnd, DragError, DragMove, DragOutcome};
pub use position::Position;
