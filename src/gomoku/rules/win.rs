//! Win and draw detection
//!
//! Win detection is local: it only inspects the four lines through the
//! stone that was just placed, so it must be called right after placement.

use crate::gomoku::board::{Board, Pos, Stone};

/// Direction vectors for line checking (4 directions)
pub const DIRECTIONS: [(i32, i32); 4] = [
    (0, 1),  // Horizontal
    (1, 0),  // Vertical
    (1, 1),  // Diagonal SE
    (1, -1), // Diagonal SW
];

/// Run through `pos` along one direction.
///
/// Returns `(count, forward_end, backward_end)`: the number of contiguous
/// `color` stones including `pos` itself, and the cell just past each end of
/// the run (`None` when the run touches the edge).
#[inline]
pub fn line_through(
    board: &Board,
    pos: Pos,
    dr: i32,
    dc: i32,
    color: Stone,
) -> (u32, Option<Stone>, Option<Stone>) {
    let mut count = 1;

    let mut r = i32::from(pos.row) + dr;
    let mut c = i32::from(pos.col) + dc;
    while board.get_checked(r, c) == Some(color) {
        count += 1;
        r += dr;
        c += dc;
    }
    let forward_end = board.get_checked(r, c);

    r = i32::from(pos.row) - dr;
    c = i32::from(pos.col) - dc;
    while board.get_checked(r, c) == Some(color) {
        count += 1;
        r -= dr;
        c -= dc;
    }
    let backward_end = board.get_checked(r, c);

    (count, forward_end, backward_end)
}

/// Five-or-more check through the just-placed stone at `pos`.
///
/// Only checks 4 directions from the given position. No allocation.
#[inline]
pub fn check_win(board: &Board, pos: Pos, color: Stone) -> bool {
    if color == Stone::Empty {
        return false;
    }
    DIRECTIONS
        .iter()
        .any(|&(dr, dc)| line_through(board, pos, dr, dc, color).0 >= 5)
}

/// The winning run through `pos`, ordered from one end to the other.
pub fn find_five_line(board: &Board, pos: Pos, color: Stone) -> Option<Vec<Pos>> {
    if color == Stone::Empty || board.get(pos) != color {
        return None;
    }
    for &(dr, dc) in &DIRECTIONS {
        let mut line = vec![pos];

        let mut r = i32::from(pos.row) - dr;
        let mut c = i32::from(pos.col) - dc;
        while let Some(p) = Pos::try_new(r, c).filter(|&p| board.get(p) == color) {
            line.insert(0, p);
            r -= dr;
            c -= dc;
        }

        r = i32::from(pos.row) + dr;
        c = i32::from(pos.col) + dc;
        while let Some(p) = Pos::try_new(r, c).filter(|&p| board.get(p) == color) {
            line.push(p);
            r += dr;
            c += dc;
        }

        if line.len() >= 5 {
            return Some(line);
        }
    }
    None
}

/// Draw: every cell occupied. Callers check for a win first.
#[inline]
pub fn is_draw(board: &Board) -> bool {
    board.is_full()
}
