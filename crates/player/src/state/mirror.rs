use serde::Serialize;

use hexchess_protocol::{
    BoardPiece, ChessInfo, ChessPiece, FailureReason, ServerMessage, ShopSlot, StatePatch, Synergy,
    XpProgress,
};

/// Server-confirmed game state as last seen by this client.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub round: u32,
    pub money: u32,
    pub level: u32,
    pub xp: XpProgress,
    pub shop: Vec<Option<ShopSlot>>,
    pub bench: Vec<Option<ChessPiece>>,
    pub board: Vec<BoardPiece>,
    pub synergies: Vec<Synergy>,
    pub locked: bool,
    pub in_battle: bool,
    /// Opponent line-up of the current battle, for display only
    pub enemy_board: Vec<BoardPiece>,
}

/// The most recent intent the server rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastFailure {
    /// Intent tag, e.g. `"MoveChess"`
    pub action: &'static str,
    pub reason: FailureReason,
}

/// What changed in the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Money { old: u32, new: u32 },
    Level { old: u32, new: u32 },
    Xp { old: XpProgress, new: XpProgress },
    Round(u32),
    Shop,
    Bench,
    Board,
    Synergies,
    Locked(bool),
    Battle { in_battle: bool },
    BattleEnded { round: u32, won: bool },
    Merged { chess_name: String, star: u8 },
    Catalog,
    GameCreated { game_id: Option<String> },
    ActionFailed(LastFailure),
}

type ChangeListener = Box<dyn FnMut(&StateChange, &GameSnapshot)>;

/// Owns the [`GameSnapshot`] and notifies listeners of changes.
///
/// Money, level and xp notify only when the value actually differs. Every
/// other field present in a patch is replaced and always notifies.
#[derive(Default)]
pub struct StateMirror {
    snapshot: GameSnapshot,
    game_id: Option<String>,
    catalog: Vec<ChessInfo>,
    last_failure: Option<LastFailure>,
    listeners: Vec<ChangeListener>,
}

impl StateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> &GameSnapshot {
        &self.snapshot
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    /// Chess catalog from the last `ListChessResult`.
    pub fn catalog(&self) -> &[ChessInfo] {
        &self.catalog
    }

    pub fn last_failure(&self) -> Option<&LastFailure> {
        self.last_failure.as_ref()
    }

    pub fn clear_last_failure(&mut self) {
        self.last_failure = None;
    }

    /// Listeners get the change and the snapshot after it was applied.
    pub fn subscribe(&mut self, listener: impl FnMut(&StateChange, &GameSnapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, changes: Vec<StateChange>) {
        for change in &changes {
            for listener in self.listeners.iter_mut() {
                listener(change, &self.snapshot);
            }
        }
    }

    /// Merge a server-confirmed patch. Returns the changes it caused.
    pub fn apply_patch(&mut self, patch: &StatePatch) -> Vec<StateChange> {
        if patch.is_empty() {
            tracing::trace!("Ignoring empty state patch");
            return Vec::new();
        }
        let changes = self.merge(patch);
        self.notify(changes.clone());
        changes
    }

    fn merge(&mut self, patch: &StatePatch) -> Vec<StateChange> {
        let mut changes = Vec::new();
        let s = &mut self.snapshot;

        if let Some(round) = patch.round {
            s.round = round;
            changes.push(StateChange::Round(round));
        }
        if let Some(money) = patch.money {
            if money != s.money {
                changes.push(StateChange::Money {
                    old: s.money,
                    new: money,
                });
                s.money = money;
            }
        }
        if let Some(level) = patch.level {
            if level != s.level {
                changes.push(StateChange::Level {
                    old: s.level,
                    new: level,
                });
                s.level = level;
            }
        }
        if let Some(xp) = patch.xp {
            if xp != s.xp {
                changes.push(StateChange::Xp { old: s.xp, new: xp });
                s.xp = xp;
            }
        }
        if let Some(shop) = &patch.shop {
            s.shop = shop.clone();
            changes.push(StateChange::Shop);
        }
        if let Some(bench) = &patch.bench {
            s.bench = bench.clone();
            changes.push(StateChange::Bench);
        }
        if let Some(board) = &patch.board {
            s.board = board.clone();
            changes.push(StateChange::Board);
        }
        if let Some(synergies) = &patch.synergies {
            s.synergies = synergies.clone();
            changes.push(StateChange::Synergies);
        }
        if let Some(locked) = patch.locked {
            s.locked = locked;
            changes.push(StateChange::Locked(locked));
        }
        if let Some(in_battle) = patch.in_battle {
            s.in_battle = in_battle;
            if !in_battle {
                s.enemy_board.clear();
            }
            changes.push(StateChange::Battle { in_battle });
        }
        changes
    }

    /// Apply whatever an inbound server message confirms.
    ///
    /// Rejected intents (`success: false`) leave the snapshot untouched and
    /// are recorded as the [`LastFailure`].
    pub fn apply_server_message(&mut self, message: &ServerMessage) -> Vec<StateChange> {
        if let Some(result) = message.as_result() {
            if !result.success {
                let failure = LastFailure {
                    action: result.intent,
                    reason: result
                        .reason
                        .cloned()
                        .unwrap_or_else(|| FailureReason::Other("unknown".into())),
                };
                tracing::debug!(
                    action = failure.action,
                    reason = %failure.reason,
                    "Server rejected intent"
                );
                self.last_failure = Some(failure.clone());
                let changes = vec![StateChange::ActionFailed(failure)];
                self.notify(changes.clone());
                return changes;
            }
        }

        let mut changes = Vec::new();
        let mut patch = None;
        match message {
            ServerMessage::CreateGameResult(result) => {
                self.game_id = result.game_id.clone();
                changes.push(StateChange::GameCreated {
                    game_id: result.game_id.clone(),
                });
                patch = result.state.as_ref();
            }
            ServerMessage::ListChessResult(result) => {
                self.catalog = result.chess.clone();
                changes.push(StateChange::Catalog);
            }
            ServerMessage::XpUpdatedNotice(notice) => {
                let xp_patch = StatePatch {
                    xp: Some(notice.xp),
                    level: notice.level,
                    ..StatePatch::default()
                };
                changes.extend(self.merge(&xp_patch));
            }
            ServerMessage::LevelUpNotice(notice) => {
                let level_patch = StatePatch {
                    level: Some(notice.level),
                    xp: notice.xp,
                    ..StatePatch::default()
                };
                changes.extend(self.merge(&level_patch));
            }
            ServerMessage::MergeNotice(notice) => {
                changes.push(StateChange::Merged {
                    chess_name: notice.chess_name.clone(),
                    star: notice.star,
                });
                patch = notice.state.as_ref();
            }
            ServerMessage::BattleNotice(notice) => {
                let battle_patch = StatePatch {
                    in_battle: Some(notice.in_battle),
                    round: notice.round,
                    ..StatePatch::default()
                };
                changes.extend(self.merge(&battle_patch));
            }
            ServerMessage::BattleStartNotice(notice) => {
                self.snapshot.enemy_board = notice.enemy_board.clone();
                let battle_patch = StatePatch {
                    in_battle: Some(true),
                    round: Some(notice.round),
                    ..StatePatch::default()
                };
                changes.extend(self.merge(&battle_patch));
            }
            ServerMessage::BattleEndNotice(notice) => {
                let battle_patch = StatePatch {
                    in_battle: Some(false),
                    round: Some(notice.round),
                    ..StatePatch::default()
                };
                changes.extend(self.merge(&battle_patch));
                changes.push(StateChange::BattleEnded {
                    round: notice.round,
                    won: notice.won,
                });
                patch = notice.state.as_ref();
            }
            ServerMessage::Unknown { kind, .. } => {
                tracing::debug!(tag = %kind, "Ignoring unknown server message");
            }
            other => {
                patch = other.as_result().and_then(|result| result.state);
            }
        }

        if let Some(patch) = patch {
            changes.extend(self.merge(patch));
        }
        self.notify(changes.clone());
        changes
    }
}

impl std::fmt::Debug for StateMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMirror")
            .field("snapshot", &self.snapshot)
            .field("game_id", &self.game_id)
            .field("catalog", &self.catalog.len())
            .field("last_failure", &self.last_failure)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
