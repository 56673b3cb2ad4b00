//! AI engine: three difficulty strategies on top of the evaluator and search
//!
//! Every strategy follows the same shape. Tactical shortcuts come first
//! (take a win, block a win, block an open four or three), then a static
//! ranking of candidate cells, and for the stronger tiers an alpha-beta
//! search over the best-ranked candidates:
//!
//! | tier   | radius | shortcuts                          | search             |
//! |--------|--------|------------------------------------|--------------------|
//! | easy   | 2      | block five, open four, open three  | none (static best) |
//! | medium | 2      | win, block five, block open four   | top 22, depth 4    |
//! | hard   | 1      | center opening, win, block five    | top 15, depth 5    |
//!
//! Strategies work on a private copy of the board, so the caller's board is
//! never touched.
//!
//! # Example
//!
//! ```
//! use game_hall::gomoku::board::{Board, Pos, Stone};
//! use game_hall::gomoku::engine::{AIEngine, Difficulty};
//!
//! let mut engine = AIEngine::new(Difficulty::Easy);
//! let mut board = Board::new();
//! board.place_stone(Pos::center(), Stone::Black);
//!
//! let result = engine.get_move_with_stats(&board, Stone::White);
//! println!("Best move: {:?} via {:?}", result.best_move, result.search_type);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::gomoku::board::{Board, Pos, Stone};
use crate::gomoku::eval::{position_score, quick_eval, PatternScore};
use crate::gomoku::rules::{check_win, would_open_four, would_open_three, would_win};
use crate::gomoku::search::{SearchResult, Searcher, INF};

/// Candidate radius for the easy and medium tiers and the fallback move
pub const WIDE_RADIUS: u8 = 2;
/// Candidate radius for the hard tier
pub const NARROW_RADIUS: u8 = 1;

/// Root candidates kept for the medium search
pub const MEDIUM_TOP_K: usize = 22;
/// Root candidates kept for the hard search
pub const HARD_TOP_K: usize = 15;

/// Medium search depth, counting the root ply
pub const MEDIUM_DEPTH: i32 = 4;
/// Hard search depth, counting the root ply
pub const HARD_DEPTH: i32 = 5;

/// AI strength tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown difficulty name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyError(String);

impl fmt::Display for ParseDifficultyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown difficulty '{}' (expected easy, medium or hard)",
            self.0
        )
    }
}

impl std::error::Error for ParseDifficultyError {}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Which step of a strategy produced the move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    /// Center stone on an empty board
    Opening,
    /// Completes five
    ImmediateWin,
    /// Blocks an opponent five, open four or open three
    Defense,
    /// Best static score without search
    Heuristic,
    /// Alpha-beta search over the top-ranked candidates
    AlphaBeta,
    /// Strategy result was missing or illegal; first nearby empty cell used
    Fallback,
}

/// Result of a move search with detailed statistics.
#[derive(Debug, Clone)]
pub struct MoveResult {
    /// Best move found, `None` only on a full board
    pub best_move: Option<Pos>,
    /// Static or minimax score of the move for the side to move
    pub score: i32,
    /// Step of the strategy that produced this move
    pub search_type: SearchType,
    /// Time taken in milliseconds
    pub time_ms: u64,
    /// Number of search nodes visited
    pub nodes: u64,
}

impl MoveResult {
    #[inline]
    fn opening(pos: Pos) -> Self {
        Self {
            best_move: Some(pos),
            score: 0,
            search_type: SearchType::Opening,
            time_ms: 0,
            nodes: 0,
        }
    }

    #[inline]
    fn immediate_win(pos: Pos) -> Self {
        Self {
            best_move: Some(pos),
            score: PatternScore::FIVE,
            search_type: SearchType::ImmediateWin,
            time_ms: 0,
            nodes: 0,
        }
    }

    #[inline]
    fn defense(pos: Pos, score: i32, nodes: u64) -> Self {
        Self {
            best_move: Some(pos),
            score,
            search_type: SearchType::Defense,
            time_ms: 0,
            nodes,
        }
    }

    #[inline]
    fn heuristic(pos: Option<Pos>, score: i32) -> Self {
        Self {
            best_move: pos,
            score,
            search_type: SearchType::Heuristic,
            time_ms: 0,
            nodes: 0,
        }
    }

    #[inline]
    fn from_alphabeta(result: SearchResult) -> Self {
        Self {
            best_move: result.best_move,
            score: result.score,
            search_type: SearchType::AlphaBeta,
            time_ms: result.time_ms,
            nodes: result.nodes,
        }
    }

    #[inline]
    fn fallback(pos: Option<Pos>) -> Self {
        Self {
            best_move: pos,
            score: 0,
            search_type: SearchType::Fallback,
            time_ms: 0,
            nodes: 0,
        }
    }
}

/// Main AI engine for Gomoku.
///
/// Holds only the difficulty and the searcher's counters; it carries no
/// position state between calls.
#[derive(Debug, Default)]
pub struct AIEngine {
    difficulty: Difficulty,
    searcher: Searcher,
}

impl AIEngine {
    #[must_use]
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            searcher: Searcher::new(),
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Get the best move for `color`. Convenience wrapper around
    /// [`AIEngine::get_move_with_stats`].
    #[must_use]
    pub fn get_move(&mut self, board: &Board, color: Stone) -> Option<Pos> {
        self.get_move_with_stats(board, color).best_move
    }

    /// Run the configured strategy for `color` and validate its answer.
    ///
    /// A missing, out-of-range or occupied result is replaced by
    /// [`get_fallback_move`], so a move is returned whenever the board has an
    /// empty cell.
    #[must_use]
    pub fn get_move_with_stats(&mut self, board: &Board, color: Stone) -> MoveResult {
        let start = Instant::now();
        let mut work = board.clone();
        self.searcher.reset();

        let mut result = match self.difficulty {
            Difficulty::Easy => self.easy(&mut work, color),
            Difficulty::Medium => self.medium(&mut work, color),
            Difficulty::Hard => self.hard(&mut work, color),
        };

        let legal = result.best_move.is_some_and(|p| board.is_empty(p));
        if !legal {
            warn!(
                difficulty = %self.difficulty,
                proposed = ?result.best_move,
                "AI strategy produced no legal move, using fallback"
            );
            result = MoveResult::fallback(get_fallback_move(board));
        }
        result.time_ms = start.elapsed().as_millis() as u64;

        debug!(
            difficulty = %self.difficulty,
            %color,
            best_move = ?result.best_move,
            search_type = ?result.search_type,
            score = result.score,
            nodes = result.nodes,
            time_ms = result.time_ms,
            "AI move chosen"
        );
        result
    }

    /// No search. Block a five, then an open four, then an open three, else
    /// play the best static cell.
    fn easy(&mut self, board: &mut Board, color: Stone) -> MoveResult {
        let cells = board.candidate_cells(WIDE_RADIUS);
        let opp = color.opponent();

        if let Some(pos) = first_where(board, &cells, |b, p| would_win(b, p, opp)) {
            return MoveResult::defense(pos, 0, 0);
        }

        let open_fours = all_where(board, &cells, |b, p| would_open_four(b, p, opp));
        if let Some((pos, score)) = best_static(board, &open_fours, color) {
            return MoveResult::defense(pos, score, 0);
        }

        let open_threes = all_where(board, &cells, |b, p| would_open_three(b, p, opp));
        if let Some((pos, score)) = best_static(board, &open_threes, color) {
            return MoveResult::defense(pos, score, 0);
        }

        match best_static(board, &cells, color) {
            Some((pos, score)) => MoveResult::heuristic(Some(pos), score),
            None => MoveResult::heuristic(cells.first().copied(), 0),
        }
    }

    /// Win, block five, block an open four by 3-ply lookahead, else search
    /// the 22 best static cells to depth 4.
    fn medium(&mut self, board: &mut Board, color: Stone) -> MoveResult {
        let cells = board.candidate_cells(WIDE_RADIUS);
        let opp = color.opponent();

        if let Some(pos) = first_where(board, &cells, |b, p| would_win(b, p, color)) {
            return MoveResult::immediate_win(pos);
        }
        if let Some(pos) = first_where(board, &cells, |b, p| would_win(b, p, opp)) {
            return MoveResult::defense(pos, 0, 0);
        }

        let open_fours = all_where(board, &cells, |b, p| would_open_four(b, p, opp));
        if !open_fours.is_empty() {
            let result = self
                .searcher
                .search_root(board, &open_fours, MEDIUM_DEPTH, color);
            let pos = result.best_move.unwrap_or(open_fours[0]);
            return MoveResult::defense(pos, result.score, result.nodes);
        }

        let ranked = rank_candidates(board, &cells, color, true);
        let top: Vec<Pos> = ranked.iter().take(MEDIUM_TOP_K).map(|&(p, _)| p).collect();
        self.search_top(board, &top, &cells, MEDIUM_DEPTH, color)
    }

    /// Center on an empty board, win, block five, else search the 15 best
    /// radius-1 cells to depth 5.
    fn hard(&mut self, board: &mut Board, color: Stone) -> MoveResult {
        if board.is_board_empty() {
            return MoveResult::opening(Pos::center());
        }

        let cells = board.candidate_cells(NARROW_RADIUS);
        let opp = color.opponent();

        if let Some(pos) = first_where(board, &cells, |b, p| would_win(b, p, color)) {
            return MoveResult::immediate_win(pos);
        }
        if let Some(pos) = first_where(board, &cells, |b, p| would_win(b, p, opp)) {
            return MoveResult::defense(pos, 0, 0);
        }

        let ranked = rank_candidates(board, &cells, color, false);
        let top: Vec<Pos> = ranked.iter().take(HARD_TOP_K).map(|&(p, _)| p).collect();
        self.search_top(board, &top, &cells, HARD_DEPTH, color)
    }

    fn search_top(
        &mut self,
        board: &mut Board,
        top: &[Pos],
        cells: &[Pos],
        depth: i32,
        color: Stone,
    ) -> MoveResult {
        let result = self.searcher.search_root(board, top, depth, color);
        if result.best_move.is_some() {
            return MoveResult::from_alphabeta(result);
        }
        // Only reachable with no candidates at all
        let pos = top.first().or_else(|| cells.first()).copied();
        MoveResult::heuristic(pos, -INF)
    }
}

/// First nearby empty cell (radius 2), else the first empty cell in
/// row-major order. `None` only on a full board.
pub fn get_fallback_move(board: &Board) -> Option<Pos> {
    board
        .candidate_cells(WIDE_RADIUS)
        .into_iter()
        .find(|&p| board.is_empty(p))
        .or_else(|| board.empty_cells().into_iter().next())
}

/// Static value of playing `pos`: net line advantage afterwards plus center
/// preference.
fn static_score(board: &mut Board, pos: Pos, color: Stone) -> i32 {
    board.place_stone(pos, color);
    let s = quick_eval(board, color) + position_score(pos);
    board.remove_stone(pos);
    s
}

/// Highest static score among `cells`; ties keep the earliest cell.
fn best_static(board: &mut Board, cells: &[Pos], color: Stone) -> Option<(Pos, i32)> {
    let mut best: Option<(Pos, i32)> = None;
    for &pos in cells {
        let s = static_score(board, pos, color);
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((pos, s));
        }
    }
    best
}

/// Static ranking, best first. Stable: equal scores keep discovery order.
/// With `five_first`, a cell completing five scores `FIVE` outright.
fn rank_candidates(
    board: &mut Board,
    cells: &[Pos],
    color: Stone,
    five_first: bool,
) -> Vec<(Pos, i32)> {
    let mut scored: Vec<(Pos, i32)> = cells
        .iter()
        .map(|&pos| {
            board.place_stone(pos, color);
            let s = if five_first && check_win(board, pos, color) {
                PatternScore::FIVE
            } else {
                quick_eval(board, color) + position_score(pos)
            };
            board.remove_stone(pos);
            (pos, s)
        })
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}

fn first_where(
    board: &mut Board,
    cells: &[Pos],
    mut pred: impl FnMut(&mut Board, Pos) -> bool,
) -> Option<Pos> {
    cells.iter().copied().find(|&p| pred(board, p))
}

fn all_where(
    board: &mut Board,
    cells: &[Pos],
    mut pred: impl FnMut(&mut Board, Pos) -> bool,
) -> Vec<Pos> {
    cells.iter().copied().filter(|&p| pred(board, p)).collect()
}
