//! The client context object.
//!
//! `GameClient` is constructed once at startup and passed to whatever drives
//! it (the headless binary, a renderer's input loop, tests). It owns one of
//! each core component and wires them together:
//!
//! ```text
//! pointer ─▶ DragDropManager ─▶ ConnectionManager ─▶ server
//!                                      │
//!                 StateMirror ◀── subscription (every known tag)
//! ```
//!
//! Mirror listeners run inside the connection's dispatch pass. They receive the
//! change and the updated snapshot and must not reach back into the client.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use hexchess_protocol::{ChessPiece, ClientMessage, ServerMessage};

use crate::config::ClientConfig;
use crate::hex::HexLayout;
use crate::infrastructure::messaging::{
    ConnectionError, ConnectionManager, ConnectionStatus, MessageCallback, Step,
};
use crate::infrastructure::websocket::Transport;
use crate::interaction::{DragDropManager, DragError, DragOutcome, Position};
use crate::state::{GameSnapshot, StateChange, StateMirror};

pub struct GameClient<T: Transport> {
    connection: ConnectionManager<T>,
    mirror: Rc<RefCell<StateMirror>>,
    drag: DragDropManager,
    layout: HexLayout,
}

impl<T: Transport> GameClient<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        let mut connection = ConnectionManager::new(transport, config.connection_settings());
        let mirror = Rc::new(RefCell::new(StateMirror::new()));

        let sink = Rc::clone(&mirror);
        let apply: MessageCallback = Rc::new(move |message: &ServerMessage| {
            sink.borrow_mut().apply_server_message(message);
        });
        for tag in ServerMessage::KNOWN_TAGS {
            connection.on(*tag, Rc::clone(&apply));
        }

        Self {
            connection,
            mirror,
            drag: DragDropManager::new(config.bench_size, config.board),
            layout: HexLayout::new(config.board, config.cell_size),
        }
    }

    // =========================================================================
    // Connection
    // =========================================================================

    pub async fn connect(&mut self) -> Result<(), ConnectionError> {
        self.connection.connect().await
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub async fn step(&mut self) -> Step {
        self.connection.step().await
    }

    pub async fn run(&mut self) {
        self.connection.run().await;
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    /// For extra subscriptions (`on`/`off`) and status listeners.
    pub fn connection_mut(&mut self) -> &mut ConnectionManager<T> {
        &mut self.connection
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn mirror(&self) -> Ref<'_, StateMirror> {
        self.mirror.borrow()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.mirror.borrow().snapshot().clone()
    }

    pub fn on_state_change(
        &mut self,
        listener: impl FnMut(&StateChange, &GameSnapshot) + 'static,
    ) {
        self.mirror.borrow_mut().subscribe(listener);
    }

    // =========================================================================
    // Intents
    // =========================================================================

    pub fn create_game(&mut self) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::CreateGame {})
    }

    pub fn request_state(&mut self) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::GetGameState {})
    }

    pub fn list_chess(&mut self) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::ListChess {})
    }

    pub fn refresh_shop(&mut self) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::RefreshShop {})
    }

    pub fn buy_chess(&mut self, chess_name: impl Into<String>) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::BuyChess {
            chess_name: chess_name.into(),
        })
    }

    pub fn lock_shop(&mut self, locked: bool) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::LockShop { locked })
    }

    pub fn sell_chess(&mut self, unit_id: impl Into<String>) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::SellChess {
            unit_id: unit_id.into(),
        })
    }

    pub fn buy_xp(&mut self) -> Result<(), ConnectionError> {
        self.connection.send(&ClientMessage::BuyXp {})
    }

    // =========================================================================
    // Board and drag
    // =========================================================================

    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn rotate_board(&mut self, delta: f32) {
        self.layout.rotate(delta);
    }

    pub fn drag(&self) -> &DragDropManager {
        &self.drag
    }

    /// For drag listeners.
    pub fn drag_mut(&mut self) -> &mut DragDropManager {
        &mut self.drag
    }

    pub fn start_drag(&mut self, piece: &ChessPiece, source: Position) -> Result<(), DragError> {
        self.drag.start_drag(piece, source)
    }

    pub fn move_drag(&mut self, x: f32, y: f32) -> bool {
        self.drag.move_drag(x, y)
    }

    pub fn end_drag(&mut self, target: Option<Position>) -> Result<DragOutcome, DragError> {
        self.drag.end_drag(target, &mut self.connection)
    }

    /// Release over the board plane at world `(x, z)`. Off-board cancels.
    pub fn drop_on_board(&mut self, x: f32, z: f32) -> Result<DragOutcome, DragError> {
        let target = self.drag.resolve_board_drop(&self.layout, x, z);
        self.end_drag(target)
    }
}

impl<T: Transport> std::fmt::Debug for GameClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient")
            .field("connection", &self.connection)
            .field("mirror", &self.mirror)
            .field("drag", &self.drag)
            .field("layout", &self.layout)
            .finish()
    }
}
