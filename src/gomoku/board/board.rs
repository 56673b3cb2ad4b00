//! Board structure: two bitboards plus candidate-cell generation

use super::bitboard::Bitboard;
use super::{Pos, Stone, BOARD_SIZE, TOTAL_CELLS};

/// 15x15 Gomoku board.
///
/// The board itself carries no turn or history; those live in
/// [`crate::gomoku::game::GameState`]. Search code mutates a working copy
/// with `place_stone`/`remove_stone` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    /// Black stones bitboard
    pub black: Bitboard,
    /// White stones bitboard
    pub white: Bitboard,
}

impl Board {
    pub fn new() -> Self {
        Self {
            black: Bitboard::new(),
            white: Bitboard::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        BOARD_SIZE
    }

    /// Get stone at position
    #[inline]
    pub fn get(&self, pos: Pos) -> Stone {
        if self.black.get(pos) {
            Stone::Black
        } else if self.white.get(pos) {
            Stone::White
        } else {
            Stone::Empty
        }
    }

    /// Stone at signed coordinates; `None` when off the board
    #[inline]
    pub fn get_checked(&self, row: i32, col: i32) -> Option<Stone> {
        Pos::try_new(row, col).map(|p| self.get(p))
    }

    /// Check if position is empty
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        !self.black.get(pos) && !self.white.get(pos)
    }

    /// Place a stone. Placing `Stone::Empty` is a no-op.
    #[inline]
    pub fn place_stone(&mut self, pos: Pos, stone: Stone) {
        match stone {
            Stone::Black => self.black.set(pos),
            Stone::White => self.white.set(pos),
            Stone::Empty => {}
        }
    }

    /// Remove a stone
    #[inline]
    pub fn remove_stone(&mut self, pos: Pos) {
        self.black.clear(pos);
        self.white.clear(pos);
    }

    /// Get bitboard for a color (returns None for Empty)
    #[inline]
    pub fn stones(&self, stone: Stone) -> Option<&Bitboard> {
        match stone {
            Stone::Black => Some(&self.black),
            Stone::White => Some(&self.white),
            Stone::Empty => None,
        }
    }

    /// Total stones on board
    #[inline]
    pub fn stone_count(&self) -> u32 {
        self.black.count() + self.white.count()
    }

    /// Check if board is empty
    #[inline]
    pub fn is_board_empty(&self) -> bool {
        self.black.is_empty() && self.white.is_empty()
    }

    /// Check if every cell is occupied
    #[inline]
    pub fn is_full(&self) -> bool {
        self.stone_count() as usize == TOTAL_CELLS
    }

    /// All empty cells in row-major order
    pub fn empty_cells(&self) -> Vec<Pos> {
        (0..TOTAL_CELLS)
            .map(Pos::from_index)
            .filter(|&p| self.is_empty(p))
            .collect()
    }

    /// Empty cells within Chebyshev `radius` of any stone.
    ///
    /// Cells are returned in discovery order: stones are visited row-major and
    /// each stone's neighborhood is scanned top-left to bottom-right. Strategies
    /// break ties by this order, so it must stay stable.
    ///
    /// On an empty board the empty cells of the 3x3 block around the center are
    /// returned (or the center alone). If no empty cell is near a stone, every
    /// empty cell is returned.
    pub fn candidate_cells(&self, radius: u8) -> Vec<Pos> {
        let occupied = self.black.union(&self.white);
        if occupied.is_empty() {
            let center = Pos::center();
            let out: Vec<Pos> = (-1i32..=1)
                .flat_map(|dr| (-1i32..=1).map(move |dc| (dr, dc)))
                .filter_map(|(dr, dc)| {
                    Pos::try_new(i32::from(center.row) + dr, i32::from(center.col) + dc)
                })
                .filter(|&p| self.is_empty(p))
                .collect();
            return if out.is_empty() { vec![center] } else { out };
        }

        let radius = i32::from(radius);
        let mut seen = Bitboard::new();
        let mut out = Vec::with_capacity(64);
        for stone in occupied.iter_ones() {
            for dr in -radius..=radius {
                for dc in -radius..=radius {
                    let Some(p) =
                        Pos::try_new(i32::from(stone.row) + dr, i32::from(stone.col) + dc)
                    else {
                        continue;
                    };
                    if seen.get(p) || !self.is_empty(p) {
                        continue;
                    }
                    seen.set(p);
                    out.push(p);
                }
            }
        }

        if out.is_empty() {
            self.empty_cells()
        } else {
            out
        }
    }

    /// Row-major grid of cell codes (0 empty, 1 black, 2 white)
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        (0..BOARD_SIZE)
            .map(|r| {
                (0..BOARD_SIZE)
                    .map(|c| self.get(Pos::new(r as u8, c as u8)).code())
                    .collect()
            })
            .collect()
    }

    /// Rebuild a board from a grid of cell codes. Cells outside 15x15 are ignored.
    pub fn from_grid(grid: &[Vec<u8>]) -> Self {
        let mut board = Board::new();
        for (r, row) in grid.iter().enumerate().take(BOARD_SIZE) {
            for (c, &code) in row.iter().enumerate().take(BOARD_SIZE) {
                board.place_stone(Pos::new(r as u8, c as u8), Stone::from_code(code));
            }
        }
        board
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "   ")?;
        for c in 0..BOARD_SIZE {
            write!(f, "{:3}", c)?;
        }
        writeln!(f)?;
        for r in 0..BOARD_SIZE {
            write!(f, "{:2} ", r)?;
            for c in 0..BOARD_SIZE {
                let ch = match self.get(Pos::new(r as u8, c as u8)) {
                    Stone::Black => "  X",
                    Stone::White => "  O",
                    Stone::Empty => "  .",
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
