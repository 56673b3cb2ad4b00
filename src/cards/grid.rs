//! Spatial index over integer grid cells
//!
//! A card at `(row, col)` may straddle cell boundaries because of the half
//! cell offset, so it is registered under every cell in
//! `floor(row)..=floor(row + 1)` x `floor(col)..=floor(col + 1)` that lies
//! on the grid. Each cell keeps its cards ordered top layer first, which
//! makes "what is on top here" a scan of a handful of entries.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::card::{Card, CardId};
use super::deck::Deck;

/// Packed cell key, `row * cols + col`
pub type CellKey = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellEntry {
    pub id: CardId,
    pub layer: u32,
}

#[derive(Debug, Clone, Default)]
pub struct GridIndex {
    rows: u32,
    cols: u32,
    cells: FxHashMap<CellKey, Vec<CellEntry>>,
}

impl GridIndex {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            cells: FxHashMap::default(),
        }
    }

    /// Key of the cell containing the point, if it is on the grid
    pub fn cell_key(&self, row: f64, col: f64) -> Option<CellKey> {
        let (r, c) = (row.floor(), col.floor());
        if r < 0.0 || c < 0.0 || r >= f64::from(self.rows) || c >= f64::from(self.cols) {
            return None;
        }
        Some(r as u32 * self.cols + c as u32)
    }

    /// Every on-grid cell a card at `(row, col)` may overlap
    pub fn card_cells(&self, row: f64, col: f64) -> SmallVec<[CellKey; 4]> {
        let mut keys = SmallVec::new();
        let (min_r, max_r) = (row.floor() as i64, (row + 1.0).floor() as i64);
        let (min_c, max_c) = (col.floor() as i64, (col + 1.0).floor() as i64);
        for r in min_r..=max_r {
            for c in min_c..=max_c {
                if r >= 0 && r < i64::from(self.rows) && c >= 0 && c < i64::from(self.cols) {
                    keys.push(r as u32 * self.cols + c as u32);
                }
            }
        }
        keys
    }

    pub fn add(&mut self, card: &Card) {
        let entry = CellEntry {
            id: card.id,
            layer: card.layer,
        };
        for key in self.card_cells(card.row, card.col) {
            let list = self.cells.entry(key).or_default();
            list.push(entry);
            // stable: equal layers keep insertion order
            list.sort_by(|a, b| b.layer.cmp(&a.layer));
        }
    }

    pub fn remove(&mut self, card: &Card) {
        for key in self.card_cells(card.row, card.col) {
            if let Some(list) = self.cells.get_mut(&key) {
                if let Some(i) = list.iter().position(|e| e.id == card.id) {
                    list.remove(i);
                }
            }
        }
    }

    /// Registered cards in the cell containing the point, top layer first
    pub fn cards_at(&self, row: f64, col: f64) -> &[CellEntry] {
        self.cell_key(row, col)
            .and_then(|key| self.cells.get(&key))
            .map_or(&[], Vec::as_slice)
    }

    /// Highest card still on the pile at the point
    pub fn top_card_at<'d>(&self, row: f64, col: f64, deck: &'d Deck) -> Option<&'d Card> {
        self.cards_at(row, col)
            .iter()
            .filter_map(|e| deck.get(e.id))
            .find(|card| !card.removed)
    }

    pub fn has_card_at(&self, row: f64, col: f64, deck: &Deck) -> bool {
        self.top_card_at(row, col, deck).is_some()
    }

    /// Registered cards sharing any cell with `card`, each listed once
    pub fn neighbours(&self, card: &Card) -> SmallVec<[CellEntry; 16]> {
        let mut found: SmallVec<[CellEntry; 16]> = SmallVec::new();
        for key in self.card_cells(card.row, card.col) {
            if let Some(list) = self.cells.get(&key) {
                for entry in list {
                    if entry.id != card.id && !found.iter().any(|f| f.id == entry.id) {
                        found.push(*entry);
                    }
                }
            }
        }
        found
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Re-register every card still on the pile
    pub fn rebuild(&mut self, deck: &Deck) {
        self.clear();
        for card in deck.iter().filter(|c| !c.removed) {
            self.add(card);
        }
    }

    /// Total registrations across all cells
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.values().all(Vec::is_empty)
    }
}
