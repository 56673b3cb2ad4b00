//! Freestyle Gomoku on a 15x15 board
//!
//! - `board`: bitboard position and candidate generation
//! - `rules`: five-in-a-row, draw and placement probes
//! - `eval`: line-pattern evaluation
//! - `search`: alpha-beta minimax
//! - `engine`: easy / medium / hard strategies
//! - `game`: turn, undo, resign and online message handling

pub mod board;
pub mod engine;
pub mod eval;
pub mod game;
pub mod rules;
pub mod search;

pub use board::{Board, Move, Pos, Stone, BOARD_SIZE};
pub use engine::{get_fallback_move, AIEngine, Difficulty, MoveResult, SearchType};
pub use game::{GameMode, GameState, MoveError, Outcome, Phase};
