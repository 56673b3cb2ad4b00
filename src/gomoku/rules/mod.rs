//! Game rules for freestyle Gomoku
//!
//! - Five or more stones in a row wins (overlines allowed)
//! - A full board without a five is a draw
//! - Hypothetical-placement probes used by the AI's tactical shortcuts

pub mod probe;
pub mod win;

// Re-exports for convenient access
pub use probe::{would_open_four, would_open_three, would_win};
pub use win::{check_win, find_five_line, is_draw, line_through, DIRECTIONS};
