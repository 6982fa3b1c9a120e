use std::fmt;

use serde::{Deserialize, Serialize};

use hexchess_protocol::MoveEndpoint;

/// Where a piece sits, or where it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    Bench(usize),
    Board { x: i32, y: i32 },
}

impl Position {
    pub fn board(x: i32, y: i32) -> Self {
        Self::Board { x, y }
    }

    /// Wire form when this is where the piece comes from.
    pub fn as_source(self) -> MoveEndpoint {
        match self {
            Self::Bench(index) => MoveEndpoint::BenchSlot(index),
            Self::Board { x, y } => MoveEndpoint::Board { x, y },
        }
    }

    /// Wire form when this is where the piece is dropped.
    ///
    /// Any bench drop targets the bench as a whole; the server picks the slot.
    pub fn as_target(self) -> MoveEndpoint {
        match self {
            Self::Bench(_) => MoveEndpoint::BenchArea,
            Self::Board { x, y } => MoveEndpoint::Board { x, y },
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bench(index) => write!(f, "bench[{index}]"),
            Self::Board { x, y } => write!(f, "board({x}, {y})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_source_keeps_index_but_target_is_sentinel() {
        assert_eq!(Position::Bench(4).as_source(), MoveEndpoint::BenchSlot(4));
        assert_eq!(Position::Bench(4).as_target(), MoveEndpoint::BenchArea);
    }

    #[test]
    fn test_board_endpoint_is_symmetric() {
        let cell = Position::board(3, 1);
        assert_eq!(cell.as_source(), MoveEndpoint::Board { x: 3, y: 1 });
        assert_eq!(cell.as_target(), cell.as_source());
    }
}
