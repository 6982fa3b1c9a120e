//! Simple payload fixtures used across unit tests.

use hexchess_protocol::{BoardPiece, ChessPiece, ShopSlot, StatePatch, Synergy, XpProgress};

pub fn piece(id: &str, name: &str) -> ChessPiece {
    ChessPiece {
        id: id.to_string(),
        name: name.to_string(),
        star: 1,
        cost: 1,
    }
}

pub fn board_piece(id: &str, name: &str, x: i32, y: i32) -> BoardPiece {
    BoardPiece {
        piece: piece(id, name),
        position: [x, y],
    }
}

/// A full snapshot as sent after `CreateGame`.
pub fn opening_state() -> StatePatch {
    let mut bench = vec![None; 9];
    bench[0] = Some(piece("u1", "Knight"));
    StatePatch {
        round: Some(1),
        money: Some(10),
        level: Some(1),
        xp: Some(XpProgress {
            current: 0,
            required: 2,
        }),
        shop: Some(vec![
            Some(ShopSlot {
                chess_name: "Knight".into(),
                cost: 1,
            }),
            Some(ShopSlot {
                chess_name: "Archer".into(),
                cost: 2,
            }),
            None,
            None,
            None,
        ]),
        bench: Some(bench),
        board: Some(vec![board_piece("u2", "Archer", 3, 3)]),
        synergies: Some(vec![Synergy {
            name: "Ranger".into(),
            count: 1,
            thresholds: vec![2, 4],
            active_level: 0,
        }]),
        locked: Some(false),
        in_battle: Some(false),
    }
}
