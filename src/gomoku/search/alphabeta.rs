//! Fixed-depth minimax with alpha-beta pruning
//!
//! The search works on the caller's board in place: every child is placed,
//! searched and removed again before the next sibling is tried, so the board
//! is unchanged when a call returns. A board must not be mutated by anything
//! else while a search on it is in flight.
//!
//! Scores are always from the point of view of `color`, the side the search
//! was started for. The maximizing plies place `color` stones, the minimizing
//! plies place the opponent's.
//!
//! # Example
//!
//! ```
//! use game_hall::gomoku::board::{Board, Pos, Stone};
//! use game_hall::gomoku::search::Searcher;
//!
//! let mut board = Board::new();
//! board.place_stone(Pos::center(), Stone::Black);
//!
//! let mut searcher = Searcher::new();
//! let candidates = board.candidate_cells(1);
//! let result = searcher.search_root(&mut board, &candidates, 2, Stone::White);
//! assert!(result.best_move.is_some());
//! ```

use std::time::Instant;

use crate::gomoku::board::{Board, Pos, Stone};
use crate::gomoku::eval::{quick_eval, PatternScore};
use crate::gomoku::rules::check_win;

/// Infinity score for alpha-beta bounds
pub const INF: i32 = i32::MAX;

/// Radius used for child generation at every ply
const CHILD_RADIUS: u8 = 1;

/// Children are statically ordered only when at least this much depth remains.
const ORDERING_MIN_DEPTH: i32 = 2;

/// Search statistics for diagnostics and tuning.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    /// Total beta cutoffs (fail-high and fail-low)
    pub beta_cutoffs: u64,
    /// Cutoffs on the first child tried (measures move ordering quality)
    pub first_move_cutoffs: u64,
    /// Interior nodes whose children were statically ordered
    pub ordered_nodes: u64,
    /// Leaves that ended in a decided game
    pub terminal_wins: u64,
}

impl SearchStats {
    /// First-move cutoff rate in percent
    pub fn first_move_rate(&self) -> f64 {
        if self.beta_cutoffs == 0 {
            0.0
        } else {
            self.first_move_cutoffs as f64 / self.beta_cutoffs as f64 * 100.0
        }
    }

    fn merge(&mut self, other: &SearchStats) {
        self.beta_cutoffs += other.beta_cutoffs;
        self.first_move_cutoffs += other.first_move_cutoffs;
        self.ordered_nodes += other.ordered_nodes;
        self.terminal_wins += other.terminal_wins;
    }
}

/// Search result containing the best root move and associated statistics.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found, `None` only when no candidates were given
    pub best_move: Option<Pos>,
    /// Minimax value of the best move
    pub score: i32,
    /// Full depth including the root ply
    pub depth: i32,
    /// Total nodes visited
    pub nodes: u64,
    /// Search diagnostics
    pub stats: SearchStats,
    /// Wall time in milliseconds
    pub time_ms: u64,
}

/// Alpha-beta searcher. Holds only counters; all position state lives on the board.
#[derive(Debug, Default)]
pub struct Searcher {
    nodes: u64,
    stats: SearchStats,
}

impl Searcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes visited since the last [`Searcher::reset`]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn reset(&mut self) {
        self.nodes = 0;
        self.stats = SearchStats::default();
    }

    /// Minimax value of the current position for `color`.
    ///
    /// `depth` is the remaining depth. `winner` is the side that completed a
    /// five on the move leading here, if any. Decided positions score
    /// `FIVE - depth` for a `color` win and `-FIVE + depth` for an opponent
    /// win; depth-0 leaves score `quick_eval(color)`.
    #[allow(clippy::too_many_arguments)]
    pub fn minimax(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        color: Stone,
        winner: Option<Stone>,
    ) -> i32 {
        self.nodes += 1;
        let opp = color.opponent();

        if depth == 0 || winner.is_some() {
            return match winner {
                Some(w) if w == color => {
                    self.stats.terminal_wins += 1;
                    PatternScore::FIVE - depth
                }
                Some(w) if w == opp => {
                    self.stats.terminal_wins += 1;
                    -PatternScore::FIVE + depth
                }
                _ => quick_eval(board, color),
            };
        }

        let mut cells = board.candidate_cells(CHILD_RADIUS);
        if cells.is_empty() {
            return quick_eval(board, color);
        }
        if depth >= ORDERING_MIN_DEPTH {
            self.stats.ordered_nodes += 1;
            order_children(board, &mut cells, maximizing, color);
        }

        let mover = if maximizing { color } else { opp };
        let mut value = if maximizing { -INF } else { INF };

        for (i, &pos) in cells.iter().enumerate() {
            board.place_stone(pos, mover);
            let child_winner = if check_win(board, pos, mover) {
                Some(mover)
            } else {
                winner
            };
            let score = self.minimax(
                board,
                depth - 1,
                alpha,
                beta,
                !maximizing,
                color,
                child_winner,
            );
            board.remove_stone(pos);

            if maximizing {
                value = value.max(score);
                alpha = alpha.max(value);
            } else {
                value = value.min(score);
                beta = beta.min(value);
            }
            if beta <= alpha {
                self.stats.beta_cutoffs += 1;
                if i == 0 {
                    self.stats.first_move_cutoffs += 1;
                }
                break;
            }
        }

        value
    }

    /// Try each root candidate for `color` and keep the one with the best
    /// minimax value. Ties keep the earlier candidate.
    ///
    /// `depth` counts the root ply, so each child is searched with
    /// `depth - 1` remaining and the opponent to move. A candidate that
    /// completes a five is returned immediately.
    pub fn search_root(
        &mut self,
        board: &mut Board,
        candidates: &[Pos],
        depth: i32,
        color: Stone,
    ) -> SearchResult {
        let start = Instant::now();
        let nodes_before = self.nodes;
        let stats_before = self.stats.clone();
        self.stats = SearchStats::default();

        let mut best_move = None;
        let mut best_score = -INF;

        for &pos in candidates {
            if !board.is_empty(pos) {
                continue;
            }
            board.place_stone(pos, color);
            if check_win(board, pos, color) {
                board.remove_stone(pos);
                best_move = Some(pos);
                best_score = PatternScore::FIVE;
                break;
            }
            let score = self.minimax(board, depth - 1, -INF, INF, false, color, None);
            board.remove_stone(pos);

            if score > best_score {
                best_score = score;
                best_move = Some(pos);
            }
        }

        let stats = self.stats.clone();
        let mut merged = stats_before;
        merged.merge(&stats);
        self.stats = merged;

        SearchResult {
            best_move,
            score: best_score,
            depth,
            nodes: self.nodes - nodes_before,
            stats,
            time_ms: start.elapsed().as_millis() as u64,
        }
    }
}

/// One-ply static ordering: descending for the maximizer, ascending for the
/// minimizer. The sort is stable so equal scores keep discovery order.
fn order_children(board: &mut Board, cells: &mut Vec<Pos>, maximizing: bool, color: Stone) {
    let mover = if maximizing { color } else { color.opponent() };
    let win_score = if maximizing {
        PatternScore::FIVE
    } else {
        -PatternScore::FIVE
    };

    let mut scored: Vec<(Pos, i32)> = cells
        .iter()
        .map(|&pos| {
            board.place_stone(pos, mover);
            let s = if check_win(board, pos, mover) {
                win_score
            } else {
                quick_eval(board, color)
            };
            board.remove_stone(pos);
            (pos, s)
        })
        .collect();

    if maximizing {
        scored.sort_by(|a, b| b.1.cmp(&a.1));
    } else {
        scored.sort_by(|a, b| a.1.cmp(&b.1));
    }

    cells.clear();
    cells.extend(scored.into_iter().map(|(pos, _)| pos));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(stones: &[(u8, u8, Stone)]) -> Board {
        let mut board = Board::new();
        for &(r, c, s) in stones {
            board.place_stone(Pos::new(r, c), s);
        }
        board
    }

    /// Black has a four on row 7 closed on the left; (7,7) completes it.
    fn black_closed_four() -> Board {
        board_with(&[
            (7, 2, Stone::White),
            (7, 3, Stone::Black),
            (7, 4, Stone::Black),
            (7, 5, Stone::Black),
            (7, 6, Stone::Black),
            (3, 3, Stone::White),
            (3, 4, Stone::White),
        ])
    }

    #[test]
    fn test_terminal_scores_by_depth() {
        let mut board = black_closed_four();
        let mut searcher = Searcher::new();
        for d in 1..=5 {
            let own = searcher.minimax(&mut board, d, -INF, INF, true, Stone::Black, Some(Stone::Black));
            assert_eq!(own, PatternScore::FIVE - d, "self-win at remaining depth {}", d);

            let theirs =
                searcher.minimax(&mut board, d, -INF, INF, false, Stone::Black, Some(Stone::White));
            assert_eq!(theirs, -PatternScore::FIVE + d, "opponent win at remaining depth {}", d);
        }
    }

    #[test]
    fn test_depth_zero_is_quick_eval() {
        let mut board = black_closed_four();
        let mut searcher = Searcher::new();
        let v = searcher.minimax(&mut board, 0, -INF, INF, true, Stone::Black, None);
        assert_eq!(v, quick_eval(&board, Stone::Black));
    }

    #[test]
    fn test_max_finds_immediate_win() {
        let mut board = black_closed_four();
        let mut searcher = Searcher::new();
        // The winning child is searched with one less remaining depth
        assert_eq!(
            searcher.minimax(&mut board, 1, -INF, INF, true, Stone::Black, None),
            PatternScore::FIVE
        );
        assert_eq!(
            searcher.minimax(&mut board, 2, -INF, INF, true, Stone::Black, None),
            PatternScore::FIVE - 1
        );
    }

    #[test]
    fn test_min_finds_opponent_win() {
        let mut board = black_closed_four();
        let mut searcher = Searcher::new();
        // Scored for White: Black to move and about to win
        assert_eq!(
            searcher.minimax(&mut board, 2, -INF, INF, false, Stone::White, None),
            -PatternScore::FIVE + 1
        );
    }

    #[test]
    fn test_search_leaves_board_unchanged() {
        let mut board = black_closed_four();
        let before = board.clone();
        let mut searcher = Searcher::new();
        let candidates = board.candidate_cells(1);
        let _ = searcher.search_root(&mut board, &candidates, 3, Stone::White);
        assert_eq!(board, before);
        assert!(searcher.nodes() > 0);
    }

    #[test]
    fn test_search_root_takes_win() {
        let mut board = black_closed_four();
        let mut searcher = Searcher::new();
        let candidates = board.candidate_cells(1);
        let result = searcher.search_root(&mut board, &candidates, 3, Stone::Black);
        assert_eq!(result.best_move, Some(Pos::new(7, 7)));
        assert_eq!(result.score, PatternScore::FIVE);
    }

    #[test]
    fn test_search_root_blocks_four() {
        let mut board = black_closed_four();
        let mut searcher = Searcher::new();
        let candidates = board.candidate_cells(1);
        let result = searcher.search_root(&mut board, &candidates, 2, Stone::White);
        assert_eq!(result.best_move, Some(Pos::new(7, 7)), "White must block the four");
    }

    #[test]
    fn test_search_root_empty_candidates() {
        let mut board = Board::new();
        let mut searcher = Searcher::new();
        let result = searcher.search_root(&mut board, &[], 3, Stone::Black);
        assert_eq!(result.best_move, None);
    }

    #[test]
    fn test_ordering_is_stable_and_directional() {
        let mut board = black_closed_four();
        let mut cells = board.candidate_cells(1);
        order_children(&mut board, &mut cells, true, Stone::Black);
        assert_eq!(cells[0], Pos::new(7, 7), "winning child sorts first for the maximizer");

        let mut cells = board.candidate_cells(1);
        order_children(&mut board, &mut cells, false, Stone::White);
        assert_eq!(cells[0], Pos::new(7, 7), "opponent win sorts first for the minimizer");
    }
}
