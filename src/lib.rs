//! Game hall: a Gomoku engine with an online relay, and a daily
//! stacked-card matching puzzle.
//!
//! # Gomoku
//!
//! Freestyle rules on a 15x15 board: five or more in a row wins, a full
//! board is a draw.
//! - [`gomoku::board`]: bitboard position and candidate cells
//! - [`gomoku::rules`]: win, draw and placement probes
//! - [`gomoku::eval`]: line-pattern evaluation
//! - [`gomoku::search`]: alpha-beta minimax
//! - [`gomoku::engine`]: easy / medium / hard AI
//! - [`gomoku::game`]: game state, undo, resign, online client side
//! - [`relay`]: JSON protocol and the room server that validates moves
//!
//! # Cards
//!
//! A pile of stacked tiles dealt from the date, cleared three of a kind at
//! a time through a seven-card slot. See [`cards`].
//!
//! # Quick Start
//!
//! ```
//! use game_hall::{AIEngine, Board, Difficulty, Pos, Stone};
//!
//! let mut board = Board::new();
//! let mut engine = AIEngine::new(Difficulty::Medium);
//!
//! board.place_stone(Pos::center(), Stone::Black);
//!
//! // AI responds as White
//! if let Some(pos) = engine.get_move(&board, Stone::White) {
//!     board.place_stone(pos, Stone::White);
//!     println!("AI plays at ({}, {})", pos.row, pos.col);
//! }
//! ```
//!
//! ```
//! use game_hall::cards::{CardGame, DifficultyKey, GameConfig};
//! use rand::SeedableRng;
//!
//! let config = GameConfig::for_difficulty(DifficultyKey::Easy);
//! let game = CardGame::new(config, 20240101, rand_chacha::ChaCha8Rng::seed_from_u64(1));
//! assert_eq!(game.deck().len() % 3, 0);
//! ```

pub mod cards;
pub mod gomoku;
pub mod relay;

// Re-export commonly used types for convenience
pub use gomoku::{AIEngine, Board, Difficulty, GameMode, GameState, MoveResult, Pos, SearchType, Stone, BOARD_SIZE};
pub use relay::{ClientMessage, RelayServer, ServerMessage};
