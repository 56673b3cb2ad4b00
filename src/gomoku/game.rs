//! Game state management for Gomoku
//!
//! `GameState` owns the board, the move history and the side to move. All
//! stone placements, local or remote, go through [`GameState::place_stone`]
//! so win and draw detection is identical on every path.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::gomoku::board::{Board, Move, Pos, Stone};
use crate::gomoku::engine::{get_fallback_move, AIEngine, MoveResult};
use crate::gomoku::rules::{check_win, find_five_line, is_draw};
use crate::relay::protocol::{ClientMessage, GameOverReason, ServerMessage, Snapshot, WireColor, Winner};

/// Game mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Player vs AI
    PvE { human_color: Stone },
    /// Player vs Player (hotseat)
    PvP,
    /// Networked game through the relay. `my_color` is `Empty` until a
    /// room is created or joined.
    Online { my_color: Stone },
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::PvE {
            human_color: Stone::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won(Stone),
    Draw,
}

/// Game result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub outcome: Outcome,
    pub reason: GameOverReason,
    pub winning_line: Option<Vec<Pos>>,
}

/// Lifecycle of one game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No stone placed yet
    Setup,
    InProgress,
    Finished(Outcome),
}

/// Why a move from the human or online input path was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    GameOver,
    NotYourTurn,
    OutOfBounds,
    Occupied,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::GameOver => write!(f, "Game is over"),
            MoveError::NotYourTurn => write!(f, "Not your turn"),
            MoveError::OutOfBounds => write!(f, "Position is off the board"),
            MoveError::Occupied => write!(f, "Cell is occupied"),
        }
    }
}

impl std::error::Error for MoveError {}

/// Main game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub mode: GameMode,
    pub current_turn: Stone,
    pub history: Vec<Move>,
    pub result: Option<GameResult>,
    pub last_ai_result: Option<MoveResult>,
    /// Transient status line for the front end
    pub message: Option<String>,
    /// Online: room this client sits in
    pub room_id: Option<String>,
    /// Online: the opponent asked to take back moves
    pub pending_undo_request: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

impl GameState {
    pub fn new(mode: GameMode) -> Self {
        Self {
            board: Board::new(),
            mode,
            current_turn: Stone::Black,
            history: Vec::new(),
            result: None,
            last_ai_result: None,
            message: None,
            room_id: None,
            pending_undo_request: false,
        }
    }

    /// Back to an empty board with Black to move. Mode and room are kept.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current_turn = Stone::Black;
        self.history.clear();
        self.result = None;
        self.last_ai_result = None;
        self.message = None;
        self.pending_undo_request = false;
    }

    pub fn is_game_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.result.as_ref().map(|r| r.outcome)
    }

    pub fn phase(&self) -> Phase {
        match (&self.result, self.history.is_empty()) {
            (Some(r), _) => Phase::Finished(r.outcome),
            (None, true) => Phase::Setup,
            (None, false) => Phase::InProgress,
        }
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().copied()
    }

    /// Check if the local player may place a stone now
    pub fn is_human_turn(&self) -> bool {
        if self.is_game_over() {
            return false;
        }
        match self.mode {
            GameMode::PvE { human_color } => self.current_turn == human_color,
            GameMode::PvP => true,
            GameMode::Online { my_color } => self.current_turn == my_color,
        }
    }

    /// Check if it's the AI's turn
    pub fn is_ai_turn(&self) -> bool {
        match self.mode {
            GameMode::PvE { human_color } => {
                !self.is_game_over() && self.current_turn != human_color
            }
            _ => false,
        }
    }

    /// Place a stone for `color`.
    ///
    /// Returns `false` without changing anything if the cell is occupied or
    /// the game is already decided. Otherwise records the move, then either
    /// ends the game (five or full board) or hands the turn to the opponent
    /// of `color`.
    pub fn place_stone(&mut self, pos: Pos, color: Stone) -> bool {
        if color == Stone::Empty || self.is_game_over() || !self.board.is_empty(pos) {
            return false;
        }

        self.board.place_stone(pos, color);
        self.history.push(Move::new(pos, color));

        if check_win(&self.board, pos, color) {
            self.result = Some(GameResult {
                outcome: Outcome::Won(color),
                reason: GameOverReason::Win,
                winning_line: find_five_line(&self.board, pos, color),
            });
        } else if is_draw(&self.board) {
            self.result = Some(GameResult {
                outcome: Outcome::Draw,
                reason: GameOverReason::Draw,
                winning_line: None,
            });
        } else {
            self.current_turn = color.opponent();
        }
        true
    }

    /// Attempt a move for the local player from untrusted coordinates.
    pub fn try_place_stone(&mut self, row: i32, col: i32) -> Result<Pos, MoveError> {
        if self.is_game_over() {
            return Err(MoveError::GameOver);
        }
        if !self.is_human_turn() {
            return Err(MoveError::NotYourTurn);
        }
        let pos = Pos::try_new(row, col).ok_or(MoveError::OutOfBounds)?;
        if !self.board.is_empty(pos) {
            return Err(MoveError::Occupied);
        }

        let color = self.current_turn;
        self.place_stone(pos, color);
        self.message = None;
        Ok(pos)
    }

    /// Retract the last move. The retracted color is to move again.
    pub fn undo_last_one(&mut self) -> bool {
        let Some(m) = self.history.pop() else {
            return false;
        };
        self.board.remove_stone(m.pos);
        self.current_turn = m.color;
        self.result = None;
        true
    }

    /// Retract the last two moves. Against the AI the human is always to
    /// move afterwards; otherwise the color of the earlier move is.
    pub fn undo_last_two(&mut self) -> bool {
        if self.history.len() < 2 {
            return false;
        }
        let mut earlier = None;
        for _ in 0..2 {
            if let Some(m) = self.history.pop() {
                self.board.remove_stone(m.pos);
                earlier = Some(m);
            }
        }
        match (self.mode, earlier) {
            (GameMode::PvE { human_color }, _) => self.current_turn = human_color,
            (_, Some(m)) => self.current_turn = m.color,
            (_, None) => {}
        }
        self.result = None;
        true
    }

    /// `color` gives up; the opponent wins.
    pub fn resign(&mut self, color: Stone) -> bool {
        if self.is_game_over() || color == Stone::Empty {
            return false;
        }
        self.result = Some(GameResult {
            outcome: Outcome::Won(color.opponent()),
            reason: GameOverReason::Resign,
            winning_line: None,
        });
        true
    }

    /// Let the engine move for the side to move.
    ///
    /// The search runs behind `catch_unwind`; a panic or an illegal answer is
    /// replaced by the fallback move so the game never stalls. Returns the
    /// placed cell, or `None` if the game is over or the board is full.
    pub fn play_ai_move(&mut self, engine: &mut AIEngine) -> Option<Pos> {
        if self.is_game_over() {
            return None;
        }
        let color = self.current_turn;
        let board = self.board.clone();

        let proposed = match panic::catch_unwind(AssertUnwindSafe(|| {
            engine.get_move_with_stats(&board, color)
        })) {
            Ok(result) => {
                let pos = result.best_move;
                self.last_ai_result = Some(result);
                pos
            }
            Err(_) => {
                warn!(%color, "AI search panicked, substituting fallback move");
                None
            }
        };

        let pos = match proposed.filter(|&p| self.board.is_empty(p)) {
            Some(p) => p,
            None => match get_fallback_move(&self.board) {
                Some(p) => p,
                None => {
                    self.message = Some("AI could not find a move".to_string());
                    return None;
                }
            },
        };

        if self.place_stone(pos, color) {
            debug!(%color, row = pos.row, col = pos.col, "AI placed stone");
            Some(pos)
        } else {
            None
        }
    }

    /// Local player's move in PvE or PvP; in PvE the AI answers at once.
    /// Returns the AI's reply, if any.
    pub fn play_human_turn(
        &mut self,
        row: i32,
        col: i32,
        engine: &mut AIEngine,
    ) -> Result<Option<Pos>, MoveError> {
        self.try_place_stone(row, col)?;
        if self.is_ai_turn() {
            Ok(self.play_ai_move(engine))
        } else {
            Ok(None)
        }
    }

    /// Undo button: two plies against the AI, one in hotseat play, a
    /// request to the opponent online.
    pub fn request_undo(&mut self) -> Option<ClientMessage> {
        match self.mode {
            GameMode::PvE { .. } => {
                self.undo_last_two();
                None
            }
            GameMode::PvP => {
                self.undo_last_one();
                None
            }
            GameMode::Online { .. } => self.room_id.clone().map(|room_id| ClientMessage::UndoRequest { room_id }),
        }
    }

    /// Resign button for the local player.
    pub fn request_resign(&mut self) -> Option<ClientMessage> {
        if self.is_game_over() {
            return None;
        }
        match self.mode {
            GameMode::PvE { human_color } => {
                self.resign(human_color);
                None
            }
            GameMode::PvP => {
                self.resign(self.current_turn);
                None
            }
            GameMode::Online { .. } => self.room_id.clone().map(|room_id| ClientMessage::Resign { room_id }),
        }
    }

    // ----- Online -----

    /// Place the local player's stone and produce the `move` message for the relay.
    pub fn local_move(&mut self, row: i32, col: i32) -> Result<ClientMessage, MoveError> {
        let GameMode::Online { my_color } = self.mode else {
            return Err(MoveError::NotYourTurn);
        };
        let color = WireColor::from_stone(my_color).ok_or(MoveError::NotYourTurn)?;
        let pos = self.try_place_stone(row, col)?;
        Ok(ClientMessage::Move {
            row: i64::from(pos.row),
            col: i64::from(pos.col),
            color,
        })
    }

    /// Reply to an opponent's undo request.
    pub fn answer_undo(&mut self, accept: bool) -> Option<ClientMessage> {
        if !self.pending_undo_request {
            return None;
        }
        self.pending_undo_request = false;
        let room_id = self.room_id.clone()?;
        Some(if accept {
            ClientMessage::UndoAccept { room_id }
        } else {
            ClientMessage::UndoReject { room_id }
        })
    }

    /// Leave the room and return to an empty board.
    pub fn leave_room(&mut self) -> Option<ClientMessage> {
        let room_id = self.room_id.take()?;
        self.reset();
        Some(ClientMessage::LeaveRoom { room_id })
    }

    /// Apply one message from the relay. Returns `true` when the board,
    /// turn or result changed.
    pub fn apply_server_message(&mut self, msg: &ServerMessage) -> bool {
        match msg {
            ServerMessage::RoomCreated { room_id } => {
                self.join_as(room_id, Stone::Black);
                false
            }
            ServerMessage::RoomJoined { room_id } => {
                self.join_as(room_id, Stone::White);
                false
            }
            ServerMessage::GameStart(snapshot) | ServerMessage::UndoAccept(snapshot) => {
                self.load_snapshot(snapshot);
                self.pending_undo_request = false;
                true
            }
            ServerMessage::Move { row, col, color } => {
                match Pos::try_new(i32::from(*row), i32::from(*col)) {
                    // Echo of our own move is refused here as occupied
                    Some(pos) => self.place_stone(pos, Stone::from(*color)),
                    None => false,
                }
            }
            ServerMessage::GameOver { winner, reason } => {
                let outcome = match winner {
                    Winner::Black => Outcome::Won(Stone::Black),
                    Winner::White => Outcome::Won(Stone::White),
                    Winner::Draw => Outcome::Draw,
                };
                let winning_line = match (outcome, self.last_move()) {
                    (Outcome::Won(c), Some(m)) if m.color == c => find_five_line(&self.board, m.pos, c),
                    _ => None,
                };
                self.result = Some(GameResult {
                    outcome,
                    reason: *reason,
                    winning_line,
                });
                true
            }
            ServerMessage::UndoRequest => {
                self.pending_undo_request = true;
                self.message = Some("Opponent asks to undo".to_string());
                false
            }
            ServerMessage::UndoReject => {
                self.message = Some("Opponent declined the undo".to_string());
                false
            }
            ServerMessage::OpponentLeft => {
                if self.is_game_over() {
                    return false;
                }
                self.room_id = None;
                self.reset();
                self.message = Some("Opponent left the game".to_string());
                true
            }
            ServerMessage::Error { message } => {
                self.message = Some(message.clone());
                false
            }
        }
    }

    fn join_as(&mut self, room_id: &str, color: Stone) {
        self.mode = GameMode::Online { my_color: color };
        self.room_id = Some(room_id.to_string());
    }

    fn load_snapshot(&mut self, snapshot: &Snapshot) {
        self.board = Board::from_grid(&snapshot.board);
        self.history = snapshot
            .move_history
            .iter()
            .filter_map(|rec| rec.to_move())
            .collect();
        self.current_turn = Stone::from(snapshot.current_turn);
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gomoku::board::TOTAL_CELLS;
    use crate::gomoku::engine::Difficulty;

    fn pve() -> GameState {
        GameState::new(GameMode::PvE {
            human_color: Stone::Black,
        })
    }

    #[test]
    fn test_place_alternates_turn() {
        let mut game = GameState::new(GameMode::PvP);
        assert_eq!(game.phase(), Phase::Setup);
        assert!(game.place_stone(Pos::new(7, 7), Stone::Black));
        assert_eq!(game.current_turn, Stone::White);
        assert_eq!(game.phase(), Phase::InProgress);
        assert!(!game.place_stone(Pos::new(7, 7), Stone::White), "occupied");
        assert_eq!(game.current_turn, Stone::White);
        assert_eq!(game.history.len(), 1);
    }

    #[test]
    fn test_win_ends_game() {
        let mut game = GameState::new(GameMode::PvP);
        for i in 0..4 {
            game.place_stone(Pos::new(0, i), Stone::Black);
            game.place_stone(Pos::new(1, i), Stone::White);
        }
        game.place_stone(Pos::new(0, 4), Stone::Black);
        assert_eq!(game.phase(), Phase::Finished(Outcome::Won(Stone::Black)));
        let result = game.result.clone().expect("game over");
        assert_eq!(result.reason, GameOverReason::Win);
        assert_eq!(result.winning_line.map(|l| l.len()), Some(5));
        assert_eq!(game.current_turn, Stone::Black, "turn does not flip on a win");
        assert!(!game.place_stone(Pos::new(5, 5), Stone::White));
    }

    #[test]
    fn test_draw_on_full_board() {
        let mut game = GameState::new(GameMode::PvP);
        for idx in 0..TOTAL_CELLS - 1 {
            let p = Pos::from_index(idx);
            game.board.place_stone(p, stripe_color(p));
        }
        let last = Pos::from_index(TOTAL_CELLS - 1);
        assert!(game.place_stone(last, stripe_color(last)));
        assert_eq!(game.outcome(), Some(Outcome::Draw));
    }

    /// Column pairs alternate color and every row flips the pattern, so no
    /// line holds more than two in a row.
    fn stripe_color(p: Pos) -> Stone {
        if (p.col / 2 + p.row) % 2 == 0 {
            Stone::Black
        } else {
            Stone::White
        }
    }

    #[test]
    fn test_undo_last_one_round_trip() {
        let mut game = GameState::new(GameMode::PvP);
        game.place_stone(Pos::new(7, 7), Stone::Black);
        let board = game.board.clone();
        let turn = game.current_turn;
        game.place_stone(Pos::new(7, 8), Stone::White);
        assert!(game.undo_last_one());
        assert_eq!(game.board, board);
        assert_eq!(game.current_turn, turn);
        assert!(game.undo_last_one());
        assert!(!game.undo_last_one());
    }

    #[test]
    fn test_undo_last_two() {
        let mut game = pve();
        assert!(!game.undo_last_two());
        game.place_stone(Pos::new(7, 7), Stone::Black);
        assert!(!game.undo_last_two(), "needs two moves");
        game.place_stone(Pos::new(7, 8), Stone::White);
        assert!(game.undo_last_two());
        assert!(game.board.is_board_empty());
        assert_eq!(game.current_turn, Stone::Black);
    }

    #[test]
    fn test_undo_after_human_win_returns_turn_to_human() {
        let mut game = pve();
        for i in 0..4 {
            game.place_stone(Pos::new(7, i), Stone::Black);
            game.place_stone(Pos::new(8, i), Stone::White);
        }
        game.place_stone(Pos::new(7, 4), Stone::Black);
        assert_eq!(game.outcome(), Some(Outcome::Won(Stone::Black)));

        assert_eq!(game.request_undo(), None);
        assert!(!game.is_game_over());
        assert_eq!(game.history.len(), 7);
        assert_eq!(game.current_turn, Stone::Black);
        assert!(game.is_human_turn());
        assert!(!game.is_ai_turn());
        assert_eq!(game.try_place_stone(7, 4), Ok(Pos::new(7, 4)));
    }

    #[test]
    fn test_undo_clears_result() {
        let mut game = GameState::new(GameMode::PvP);
        for i in 0..4 {
            game.place_stone(Pos::new(0, i), Stone::Black);
            game.place_stone(Pos::new(1, i), Stone::White);
        }
        game.place_stone(Pos::new(0, 4), Stone::Black);
        assert!(game.is_game_over());
        assert!(game.undo_last_one());
        assert!(!game.is_game_over());
        assert_eq!(game.current_turn, Stone::Black);
    }

    #[test]
    fn test_try_place_stone_errors() {
        let mut game = pve();
        assert_eq!(game.try_place_stone(15, 0), Err(MoveError::OutOfBounds));
        assert_eq!(game.try_place_stone(7, 7), Ok(Pos::new(7, 7)));
        assert_eq!(game.try_place_stone(7, 8), Err(MoveError::NotYourTurn));
        game.place_stone(Pos::new(0, 0), Stone::White);
        assert_eq!(game.try_place_stone(7, 7), Err(MoveError::Occupied));
        game.resign(Stone::Black);
        assert_eq!(game.try_place_stone(3, 3), Err(MoveError::GameOver));
        assert_eq!(MoveError::GameOver.to_string(), "Game is over");
    }

    #[test]
    fn test_resign() {
        let mut game = pve();
        assert_eq!(game.request_resign(), None);
        assert_eq!(game.outcome(), Some(Outcome::Won(Stone::White)));
        assert!(!game.resign(Stone::White), "already over");
    }

    #[test]
    fn test_human_turn_triggers_ai() {
        let mut game = pve();
        let mut engine = AIEngine::new(Difficulty::Easy);
        let reply = game.play_human_turn(7, 7, &mut engine).expect("legal move");
        let reply = reply.expect("AI answers");
        assert_eq!(game.board.get(reply), Stone::White);
        assert_eq!(game.current_turn, Stone::Black);
        assert_eq!(game.history.len(), 2);
        assert!(game.last_ai_result.is_some());
    }

    #[test]
    fn test_request_undo_pve_takes_back_pair() {
        let mut game = pve();
        let mut engine = AIEngine::new(Difficulty::Easy);
        game.play_human_turn(7, 7, &mut engine).expect("legal move");
        assert_eq!(game.request_undo(), None);
        assert!(game.history.is_empty());
        assert_eq!(game.current_turn, Stone::Black);
    }

    #[test]
    fn test_online_flow() {
        let mut game = GameState::new(GameMode::Online {
            my_color: Stone::Empty,
        });
        assert_eq!(game.local_move(7, 7), Err(MoveError::NotYourTurn));

        game.apply_server_message(&ServerMessage::RoomCreated {
            room_id: "abc".to_string(),
        });
        assert_eq!(game.mode, GameMode::Online { my_color: Stone::Black });

        let msg = game.local_move(7, 7).expect("black opens");
        assert_eq!(
            msg,
            ClientMessage::Move {
                row: 7,
                col: 7,
                color: WireColor::Black
            }
        );
        // Echo from the relay is harmless
        assert!(!game.apply_server_message(&ServerMessage::Move {
            row: 7,
            col: 7,
            color: WireColor::Black
        }));
        assert_eq!(game.local_move(7, 8), Err(MoveError::NotYourTurn));

        assert!(game.apply_server_message(&ServerMessage::Move {
            row: 7,
            col: 8,
            color: WireColor::White
        }));
        assert_eq!(game.current_turn, Stone::Black);

        game.apply_server_message(&ServerMessage::UndoRequest);
        assert_eq!(
            game.answer_undo(true),
            Some(ClientMessage::UndoAccept {
                room_id: "abc".to_string()
            })
        );

        let snapshot = Snapshot::capture(&Board::new(), &[], WireColor::Black);
        assert!(game.apply_server_message(&ServerMessage::UndoAccept(snapshot)));
        assert!(game.history.is_empty());
        assert!(game.board.is_board_empty());

        game.apply_server_message(&ServerMessage::GameOver {
            winner: Winner::White,
            reason: GameOverReason::Resign,
        });
        assert_eq!(game.outcome(), Some(Outcome::Won(Stone::White)));
        assert!(!game.apply_server_message(&ServerMessage::OpponentLeft), "game already decided");
    }

    #[test]
    fn test_opponent_left_mid_game() {
        let mut game = GameState::new(GameMode::Online {
            my_color: Stone::White,
        });
        game.room_id = Some("r".to_string());
        game.place_stone(Pos::new(7, 7), Stone::Black);
        assert!(game.apply_server_message(&ServerMessage::OpponentLeft));
        assert!(game.history.is_empty());
        assert!(game.room_id.is_none());
        assert!(game.message.is_some());
    }
}
