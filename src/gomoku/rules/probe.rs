//! Hypothetical-placement probes
//!
//! Each probe places a stone, tests a pattern through it, and removes the
//! stone again before returning. The board is observably unchanged afterwards.
//! Occupied cells always probe `false`.

use crate::gomoku::board::{Board, Pos, Stone};

use super::win::{check_win, line_through, DIRECTIONS};

/// Would placing `color` at `pos` make five in a row?
pub fn would_win(board: &mut Board, pos: Pos, color: Stone) -> bool {
    if !board.is_empty(pos) {
        return false;
    }
    board.place_stone(pos, color);
    let win = check_win(board, pos, color);
    board.remove_stone(pos);
    win
}

/// Would placing `color` at `pos` make a run of four or more with both
/// extension cells empty?
pub fn would_open_four(board: &mut Board, pos: Pos, color: Stone) -> bool {
    probe_open_run(board, pos, color, |count| count >= 4)
}

/// Would placing `color` at `pos` make a run of exactly three with both
/// extension cells empty?
pub fn would_open_three(board: &mut Board, pos: Pos, color: Stone) -> bool {
    probe_open_run(board, pos, color, |count| count == 3)
}

fn probe_open_run(
    board: &mut Board,
    pos: Pos,
    color: Stone,
    accept: impl Fn(u32) -> bool,
) -> bool {
    if !board.is_empty(pos) {
        return false;
    }
    board.place_stone(pos, color);
    let found = DIRECTIONS.iter().any(|&(dr, dc)| {
        let (count, fwd, back) = line_through(board, pos, dr, dc, color);
        accept(count) && fwd == Some(Stone::Empty) && back == Some(Stone::Empty)
    });
    board.remove_stone(pos);
    found
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

    #[test]
    fn test_would_win_reverts() {
        let mut board = board_with(&[
            (7, 3, Stone::Black),
            (7, 4, Stone::Black),
            (7, 5, Stone::Black),
            (7, 6, Stone::Black),
        ]);
        let before = board.clone();
        assert!(would_win(&mut board, Pos::new(7, 7), Stone::Black));
        assert!(would_win(&mut board, Pos::new(7, 2), Stone::Black));
        assert!(!would_win(&mut board, Pos::new(7, 8), Stone::Black));
        assert!(!would_win(&mut board, Pos::new(7, 7), Stone::White));
        assert_eq!(board, before);
    }

    #[test]
    fn test_would_win_occupied_is_false() {
        let mut board = board_with(&[(0, 0, Stone::White)]);
        assert!(!would_win(&mut board, Pos::new(0, 0), Stone::White));
    }

    #[test]
    fn test_open_four_needs_both_ends() {
        let mut board = board_with(&[
            (5, 5, Stone::White),
            (5, 6, Stone::White),
            (5, 7, Stone::White),
        ]);
        assert!(would_open_four(&mut board, Pos::new(5, 8), Stone::White));
        assert!(would_open_four(&mut board, Pos::new(5, 4), Stone::White));

        // Block one side: a four with a single open end is not open
        board.place_stone(Pos::new(5, 9), Stone::Black);
        assert!(!would_open_four(&mut board, Pos::new(5, 8), Stone::White));
    }

    #[test]
    fn test_open_four_against_edge_is_closed() {
        let mut board = board_with(&[
            (0, 1, Stone::Black),
            (0, 2, Stone::Black),
            (0, 3, Stone::Black),
        ]);
        assert!(!would_open_four(&mut board, Pos::new(0, 0), Stone::Black));
        assert!(would_open_four(&mut board, Pos::new(0, 4), Stone::Black));
    }

    #[test]
    fn test_open_three_exact_length() {
        let mut board = board_with(&[(3, 3, Stone::Black), (4, 4, Stone::Black)]);
        assert!(would_open_three(&mut board, Pos::new(5, 5), Stone::Black));
        assert!(would_open_three(&mut board, Pos::new(2, 2), Stone::Black));
        // Extending an existing three to four is not a three
        board.place_stone(Pos::new(5, 5), Stone::Black);
        assert!(!would_open_three(&mut board, Pos::new(6, 6), Stone::Black));
    }

    #[test]
    fn test_probes_leave_board_untouched() {
        let mut board = board_with(&[(7, 7, Stone::Black), (7, 8, Stone::White)]);
        let before = board.clone();
        for p in board.candidate_cells(2) {
            let _ = would_open_three(&mut board, p, Stone::Black);
            let _ = would_open_four(&mut board, p, Stone::White);
        }
        assert_eq!(board, before);
    }
}
