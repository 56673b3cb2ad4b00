//! Cards and the rectangles used to describe what part of a card shows

use serde::{Deserialize, Serialize};

/// Stable card identity, assigned in placement order
pub type CardId = u32;

/// Axis-aligned rectangle in grid units. A card covers the unit square at
/// `(col, row)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub const fn unit(x: f64, y: f64) -> Self {
        Self::new(x, y, 1.0, 1.0)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Interiors intersect; touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Half-open containment: left and top edges are inside
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub card_type: u32,
    pub layer: u32,
    /// Grid row, possibly offset by half a cell
    pub row: f64,
    pub col: f64,
    /// Taken off the pile (into the slot, matched, or the removed area)
    pub removed: bool,
    pub visible: bool,
    pub visible_regions: Vec<Rect>,
    pub visible_area_ratio: f64,
}

impl Card {
    pub fn new(id: CardId, card_type: u32, layer: u32, row: f64, col: f64) -> Self {
        Self {
            id,
            card_type,
            layer,
            row,
            col,
            removed: false,
            visible: false,
            visible_regions: Vec::new(),
            visible_area_ratio: 0.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::unit(self.col, self.row)
    }

    /// Display label, `card-<id>`
    pub fn label(&self) -> String {
        format!("card-{}", self.id)
    }

    /// Fully exposed (up to `threshold`) and still on the pile
    pub fn is_selectable(&self, threshold: f64) -> bool {
        !self.removed && !self.visible_regions.is_empty() && self.visible_area_ratio >= threshold
    }

    pub(crate) fn clear_visibility(&mut self) {
        self.visible = false;
        self.visible_regions.clear();
        self.visible_area_ratio = 0.0;
    }
}
