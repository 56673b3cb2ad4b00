//! Evaluation module for Gomoku AI
//!
//! Line-based static evaluation: every maximal run of stones on every line
//! is scored by length and openness, then summed.

pub mod heuristic;
pub mod patterns;

pub use heuristic::{evaluate_board, line_count, position_score, quick_eval, score_line};
pub use patterns::{run_score, PatternScore};
