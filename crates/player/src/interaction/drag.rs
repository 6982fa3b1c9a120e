//! Drag-drop state machine.
//!
//! ```text
//!   Idle ──start_drag──▶ Dragging ──end_drag(None)──────▶ Idle (cancelled)
//!                          │   ▲
//!                move_drag └───┘    end_drag(Some(to)) ──▶ Idle (one MoveChess sent)
//! ```
//!
//! At most one session exists. A second `start_drag` while dragging is
//! rejected with [`DragError::AlreadyDragging`]; the live session is kept.
//!
//! The end notification reports what happened to the gesture locally. It
//! fires as soon as the intent is handed to the connection and says nothing
//! about whether the server accepts the move; that arrives later as a
//! `MoveChessResult` and is applied by the state mirror.

use hexchess_protocol::{ChessPiece, ClientMessage, MoveEndpoint};

use super::position::Position;
use crate::hex::{BoardShape, HexLayout};
use crate::infrastructure::messaging::{ConnectionError, EventBus, IntentSink};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    #[error("a drag of {piece_id} is already in progress")]
    AlreadyDragging { piece_id: String },

    #[error("no drag in progress")]
    NotDragging,
}

/// Pointer moved during a drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragMove {
    pub piece_id: String,
    pub source: Position,
    pub x: f32,
    pub y: f32,
}

/// How a finished gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Released without a target; nothing was sent
    Cancelled,
    /// Exactly one `MoveChess` intent went out
    Sent { from: MoveEndpoint, to: MoveEndpoint },
    /// The intent could not be sent
    SendFailed(ConnectionError),
}

impl DragOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// A gesture has ended.
#[derive(Debug, Clone, PartialEq)]
pub struct DragEnd {
    pub piece: ChessPiece,
    pub source: Position,
    pub target: Option<Position>,
    pub outcome: DragOutcome,
}

#[derive(Debug)]
struct DragSession {
    /// Copied at drag start; later server updates do not touch it
    piece: ChessPiece,
    source: Position,
    pointer: Option<(f32, f32)>,
}

pub struct DragDropManager {
    bench_size: usize,
    board: BoardShape,
    session: Option<DragSession>,
    move_listeners: EventBus<DragMove>,
    end_listeners: EventBus<DragEnd>,
}

impl DragDropManager {
    pub fn new(bench_size: usize, board: BoardShape) -> Self {
        Self {
            bench_size,
            board,
            session: None,
            move_listeners: EventBus::new(),
            end_listeners: EventBus::new(),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    /// The piece snapshot of the live session.
    pub fn dragged_piece(&self) -> Option<&ChessPiece> {
        self.session.as_ref().map(|s| &s.piece)
    }

    pub fn drag_source(&self) -> Option<Position> {
        self.session.as_ref().map(|s| s.source)
    }

    /// Last pointer position reported by `move_drag`.
    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.session.as_ref().and_then(|s| s.pointer)
    }

    pub fn on_move(&mut self, callback: impl FnMut(&DragMove) + 'static) {
        self.move_listeners.subscribe(callback);
    }

    pub fn on_end(&mut self, callback: impl FnMut(&DragEnd) + 'static) {
        self.end_listeners.subscribe(callback);
    }

    pub fn start_drag(&mut self, piece: &ChessPiece, source: Position) -> Result<(), DragError> {
        if let Some(active) = &self.session {
            tracing::warn!(
                active = %active.piece.id,
                requested = %piece.id,
                "Rejected drag start while another drag is in progress"
            );
            return Err(DragError::AlreadyDragging {
                piece_id: active.piece.id.clone(),
            });
        }
        if !self.is_valid_position(source) {
            tracing::debug!(%source, "Drag started from a position outside the configured board");
        }
        tracing::debug!(piece = %piece.id, %source, "Drag started");
        self.session = Some(DragSession {
            piece: piece.clone(),
            source,
            pointer: None,
        });
        Ok(())
    }

    /// Track the pointer. Returns false (and does nothing) when not dragging.
    pub fn move_drag(&mut self, x: f32, y: f32) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.pointer = Some((x, y));
        let event = DragMove {
            piece_id: session.piece.id.clone(),
            source: session.source,
            x,
            y,
        };
        self.move_listeners.dispatch(&event);
        true
    }

    /// Finish the gesture.
    ///
    /// Without a target the session is cancelled and nothing is sent. With a
    /// target exactly one `MoveChess` intent is handed to `sink`. Either way
    /// the session is gone afterwards and end listeners have been notified.
    pub fn end_drag(
        &mut self,
        target: Option<Position>,
        sink: &mut dyn IntentSink,
    ) -> Result<DragOutcome, DragError> {
        let session = self.session.take().ok_or(DragError::NotDragging)?;

        let outcome = match target {
            None => {
                tracing::debug!(piece = %session.piece.id, "Drag cancelled");
                DragOutcome::Cancelled
            }
            Some(to) => {
                let from = session.source.as_source();
                let to = to.as_target();
                match sink.send_intent(&ClientMessage::MoveChess { from, to }) {
                    Ok(()) => {
                        tracing::debug!(piece = %session.piece.id, %from, %to, "Move intent sent");
                        DragOutcome::Sent { from, to }
                    }
                    Err(e) => {
                        tracing::warn!(piece = %session.piece.id, "Move intent not sent: {}", e);
                        DragOutcome::SendFailed(e)
                    }
                }
            }
        };

        let event = DragEnd {
            piece: session.piece,
            source: session.source,
            target,
            outcome: outcome.clone(),
        };
        self.end_listeners.dispatch(&event);
        Ok(outcome)
    }

    /// Advisory bounds check for highlighting. Never used to block a send.
    pub fn is_valid_position(&self, position: Position) -> bool {
        match position {
            Position::Bench(index) => index < self.bench_size,
            Position::Board { x, y } => self.board.contains_index(x, y),
        }
    }

    /// Board position under a world point, through the current layout.
    pub fn resolve_board_drop(&self, layout: &HexLayout, x: f32, z: f32) -> Option<Position> {
        let cell = layout.world_to_hex(x, z)?;
        let grid = layout.hex_to_grid(cell).ok()?;
        Some(Position::board(grid.x, grid.y))
    }
}

impl std::fmt::Debug for DragDropManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragDropManager")
            .field("bench_size", &self.bench_size)
            .field("board", &self.board)
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::messaging::{ConnectionStatus, MockIntentSink};
    use crate::infrastructure::testing::fixtures::piece;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager() -> DragDropManager {
        DragDropManager::new(9, BoardShape::STANDARD)
    }

    fn record_ends(drag: &mut DragDropManager) -> Rc<RefCell<Vec<DragEnd>>> {
        let ends = Rc::new(RefCell::new(Vec::new()));
        let ends_clone = Rc::clone(&ends);
        drag.on_end(move |end| ends_clone.borrow_mut().push(end.clone()));
        ends
    }

    #[test]
    fn test_release_without_target_cancels_silently() {
        let mut drag = manager();
        let ends = record_ends(&mut drag);
        let mut sink = MockIntentSink::new();
        sink.expect_send_intent().never();

        drag.start_drag(&piece("u1", "Knight"), Position::Bench(2))
            .expect("start");
        assert!(drag.move_drag(10.0, 10.0));
        let outcome = drag.end_drag(None, &mut sink).expect("end");

        assert_eq!(outcome, DragOutcome::Cancelled);
        assert!(!drag.is_dragging());
        let ends = ends.borrow();
        assert_eq!(ends.len(), 1);
        assert_eq!(ends[0].outcome, DragOutcome::Cancelled);
        assert_eq!(ends[0].source, Position::Bench(2));
        assert_eq!(ends[0].target, None);
    }

    #[test]
    fn test_bench_to_board_sends_one_move() {
        let mut drag = manager();
        let ends = record_ends(&mut drag);
        let mut sink = MockIntentSink::new();
        sink.expect_send_intent()
            .times(1)
            .withf(|intent| {
                *intent
                    == ClientMessage::MoveChess {
                        from: MoveEndpoint::BenchSlot(0),
                        to: MoveEndpoint::Board { x: 3, y: 1 },
                    }
            })
            .returning(|_| Ok(()));

        drag.start_drag(&piece("u1", "Knight"), Position::Bench(0))
            .expect("start");
        let outcome = drag
            .end_drag(Some(Position::board(3, 1)), &mut sink)
            .expect("end");

        assert!(outcome.is_sent());
        assert!(ends.borrow()[0].outcome.is_sent());
    }

    #[test]
    fn test_bench_target_becomes_sentinel() {
        let mut drag = manager();
        let mut sink = MockIntentSink::new();
        sink.expect_send_intent()
            .times(1)
            .withf(|intent| {
                *intent
                    == ClientMessage::MoveChess {
                        from: MoveEndpoint::Board { x: 3, y: 3 },
                        to: MoveEndpoint::BenchArea,
                    }
            })
            .returning(|_| Ok(()));

        drag.start_drag(&piece("u2", "Archer"), Position::board(3, 3))
            .expect("start");
        drag.end_drag(Some(Position::Bench(7)), &mut sink)
            .expect("end");
    }

    #[test]
    fn test_send_failure_is_distinct_from_cancel() {
        let mut drag = manager();
        let ends = record_ends(&mut drag);
        let mut sink = MockIntentSink::new();
        sink.expect_send_intent()
            .times(1)
            .returning(|_| Err(ConnectionError::NotOpen(ConnectionStatus::Closed)));

        drag.start_drag(&piece("u1", "Knight"), Position::Bench(0))
            .expect("start");
        let outcome = drag
            .end_drag(Some(Position::board(3, 3)), &mut sink)
            .expect("end");

        let expected =
            DragOutcome::SendFailed(ConnectionError::NotOpen(ConnectionStatus::Closed));
        assert_eq!(outcome, expected);
        assert_eq!(ends.borrow()[0].outcome, expected);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_second_start_is_rejected_and_keeps_session() {
        let mut drag = manager();
        drag.start_drag(&piece("u1", "Knight"), Position::Bench(0))
            .expect("start");

        let err = drag
            .start_drag(&piece("u2", "Archer"), Position::Bench(1))
            .expect_err("second drag");
        assert_eq!(
            err,
            DragError::AlreadyDragging {
                piece_id: "u1".into()
            }
        );
        assert_eq!(drag.dragged_piece().map(|p| p.id.as_str()), Some("u1"));
        assert_eq!(drag.drag_source(), Some(Position::Bench(0)));
    }

    #[test]
    fn test_end_and_move_outside_drag() {
        let mut drag = manager();
        let moves = Rc::new(RefCell::new(0));
        let moves_clone = Rc::clone(&moves);
        drag.on_move(move |_| *moves_clone.borrow_mut() += 1);
        let mut sink = MockIntentSink::new();
        sink.expect_send_intent().never();

        assert!(!drag.move_drag(1.0, 1.0));
        assert_eq!(
            drag.end_drag(Some(Position::Bench(0)), &mut sink),
            Err(DragError::NotDragging)
        );
        assert_eq!(*moves.borrow(), 0);
    }

    #[test]
    fn test_move_reports_pointer() {
        let mut drag = manager();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        drag.on_move(move |event| seen_clone.borrow_mut().push((event.x, event.y)));

        drag.start_drag(&piece("u1", "Knight"), Position::Bench(0))
            .expect("start");
        drag.move_drag(4.0, 5.0);
        drag.move_drag(6.0, 7.0);

        assert_eq!(*seen.borrow(), vec![(4.0, 5.0), (6.0, 7.0)]);
        assert_eq!(drag.pointer(), Some((6.0, 7.0)));
    }

    #[test]
    fn test_snapshot_is_independent_of_caller() {
        let mut drag = manager();
        let mut knight = piece("u1", "Knight");
        drag.start_drag(&knight, Position::Bench(0)).expect("start");

        knight.star = 2;
        assert_eq!(drag.dragged_piece().map(|p| p.star), Some(1));
    }

    #[test]
    fn test_valid_positions() {
        let drag = manager();
        assert!(drag.is_valid_position(Position::Bench(0)));
        assert!(drag.is_valid_position(Position::Bench(8)));
        assert!(!drag.is_valid_position(Position::Bench(9)));
        assert!(drag.is_valid_position(Position::board(3, 3)));
        assert!(!drag.is_valid_position(Position::board(0, 0)));
        assert!(!drag.is_valid_position(Position::board(-1, 3)));
    }

    #[test]
    fn test_invalid_target_is_still_sent() {
        let mut drag = manager();
        let mut sink = MockIntentSink::new();
        sink.expect_send_intent().times(1).returning(|_| Ok(()));

        drag.start_drag(&piece("u1", "Knight"), Position::Bench(0))
            .expect("start");
        assert!(!drag.is_valid_position(Position::board(0, 0)));
        assert!(drag
            .end_drag(Some(Position::board(0, 0)), &mut sink)
            .expect("end")
            .is_sent());
    }

    #[test]
    fn test_resolve_board_drop() {
        let drag = manager();
        let layout = HexLayout::new(BoardShape::STANDARD, 1.0);

        assert_eq!(
            drag.resolve_board_drop(&layout, 0.0, 0.0),
            Some(Position::board(3, 3))
        );
        assert_eq!(drag.resolve_board_drop(&layout, 100.0, 0.0), None);
    }
}
