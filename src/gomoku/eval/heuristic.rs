//! Heuristic evaluation function for Gomoku board positions
//!
//! Every row, column and diagonal long enough to hold a five is scanned once
//! per call. Each maximal run of the scored color is looked up in the
//! pattern table by length and blocked ends.

use once_cell::sync::Lazy;

use crate::gomoku::board::{Board, Pos, Stone, BOARD_SIZE};

use super::patterns::run_score;

/// Every line on the board with at least five cells: 15 rows, 15 columns,
/// 21 diagonals and 21 anti-diagonals.
static LINES: Lazy<Vec<Vec<Pos>>> = Lazy::new(|| {
    let n = BOARD_SIZE as i32;
    let mut lines = Vec::with_capacity(72);

    for i in 0..BOARD_SIZE as u8 {
        lines.push((0..BOARD_SIZE as u8).map(|j| Pos::new(i, j)).collect());
        lines.push((0..BOARD_SIZE as u8).map(|j| Pos::new(j, i)).collect());
    }

    for d in -n..=n {
        let diag: Vec<Pos> = (0..n).filter_map(|i| Pos::try_new(i, i + d)).collect();
        let anti: Vec<Pos> = (0..n).filter_map(|i| Pos::try_new(i, n - 1 - i + d)).collect();
        if diag.len() >= 5 {
            lines.push(diag);
        }
        if anti.len() >= 5 {
            lines.push(anti);
        }
    }

    lines
});

/// Number of lines scanned by [`evaluate_board`]
pub fn line_count() -> usize {
    LINES.len()
}

/// Run-length score of one line for `color`.
///
/// Board edges count as blocked ends, as do opponent stones. Empty cells
/// are open ends.
pub fn score_line(cells: &[Stone], color: Stone) -> i32 {
    let opp = color.opponent();
    let mut score = 0;
    let mut i = 0;

    while i < cells.len() {
        if cells[i] != color {
            i += 1;
            continue;
        }
        let start = i;
        while i < cells.len() && cells[i] == color {
            i += 1;
        }
        let length = (i - start) as u32;

        let left_blocked = start == 0 || cells[start - 1] == opp;
        let right_blocked = i >= cells.len() || cells[i] == opp;
        let blocked = u8::from(left_blocked) + u8::from(right_blocked);

        score += run_score(length, blocked);
    }

    score
}

/// Sum of [`score_line`] over every line of the board.
#[must_use]
pub fn evaluate_board(board: &Board, color: Stone) -> i32 {
    let Some(own) = board.stones(color) else {
        return 0;
    };
    if own.is_empty() {
        return 0;
    }

    let mut buf = [Stone::Empty; BOARD_SIZE];
    let mut total = 0;
    for line in LINES.iter() {
        let mut any = false;
        for (slot, &pos) in buf.iter_mut().zip(line.iter()) {
            *slot = board.get(pos);
            any |= *slot == color;
        }
        if any {
            total += score_line(&buf[..line.len()], color);
        }
    }
    total
}

/// Net advantage of `color`: own line score minus the opponent's.
#[inline]
#[must_use]
pub fn quick_eval(board: &Board, color: Stone) -> i32 {
    evaluate_board(board, color) - evaluate_board(board, color.opponent())
}

/// Center preference: 15 minus the Manhattan distance to the center, floored at 0.
#[inline]
pub fn position_score(pos: Pos) -> i32 {
    let center = Pos::center();
    let d = i32::from(pos.row.abs_diff(center.row)) + i32::from(pos.col.abs_diff(center.col));
    (15 - d).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gomoku::eval::PatternScore;

    use Stone::{Black as B, Empty as E, White as W};

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(), 72);
        assert!(LINES.iter().all(|l| l.len() >= 5 && l.len() <= BOARD_SIZE));
    }

    #[test]
    fn test_score_line_open_and_blocked() {
        assert_eq!(score_line(&[E, B, B, B, E], B), PatternScore::OPEN_THREE);
        assert_eq!(score_line(&[W, B, B, B, E], B), PatternScore::CLOSED_THREE);
        assert_eq!(score_line(&[W, B, B, B, W], B), 0);
        // Edge counts as a block
        assert_eq!(score_line(&[B, B, B, B, E], B), PatternScore::CLOSED_FOUR);
        assert_eq!(score_line(&[B, B, B, B, B], B), PatternScore::FIVE);
    }

    #[test]
    fn test_score_line_multiple_runs() {
        let line = [E, B, E, B, B, E, W, B];
        let expected = PatternScore::OPEN_ONE + PatternScore::OPEN_TWO + PatternScore::CLOSED_ONE;
        assert_eq!(score_line(&line, B), expected);
        assert_eq!(score_line(&line, W), PatternScore::CLOSED_ONE);
    }

    #[test]
    fn test_evaluate_empty_board() {
        let board = Board::new();
        assert_eq!(evaluate_board(&board, Stone::Black), 0);
        assert_eq!(quick_eval(&board, Stone::White), 0);
    }

    #[test]
    fn test_evaluate_single_center_stone() {
        let mut board = Board::new();
        board.place_stone(Pos::center(), Stone::Black);
        // Row, column and both main diagonals each see one open single
        assert_eq!(evaluate_board(&board, Stone::Black), 4 * PatternScore::OPEN_ONE);
    }

    #[test]
    fn test_quick_eval_antisymmetric() {
        let mut board = Board::new();
        board.place_stone(Pos::new(7, 7), Stone::Black);
        board.place_stone(Pos::new(7, 8), Stone::Black);
        board.place_stone(Pos::new(8, 8), Stone::White);
        assert_eq!(
            quick_eval(&board, Stone::Black),
            -quick_eval(&board, Stone::White)
        );
        assert!(quick_eval(&board, Stone::Black) > 0);
    }

    #[test]
    fn test_position_score() {
        assert_eq!(position_score(Pos::center()), 15);
        assert_eq!(position_score(Pos::new(7, 8)), 14);
        assert_eq!(position_score(Pos::new(0, 0)), 0);
        assert_eq!(position_score(Pos::new(0, 7)), 8);
    }
}
