//! Visible regions of stacked cards
//!
//! Each card starts as its unit square. Every higher card overlapping it is
//! cut out with a rectangle difference, top layer first. Whatever survives
//! is the visible part; its summed area is the visible ratio.

use super::card::{Card, CardId, Rect};
use super::deck::Deck;
use super::grid::GridIndex;

/// Cards on the pile above `card` whose squares overlap it, top layer first
pub fn occluders<'d>(card: &Card, deck: &'d Deck, grid: &GridIndex) -> Vec<&'d Card> {
    let area = card.rect();
    let mut found: Vec<&Card> = grid
        .neighbours(card)
        .iter()
        .filter(|e| e.layer > card.layer)
        .filter_map(|e| deck.get(e.id))
        .filter(|upper| !upper.removed && area.overlaps(&upper.rect()))
        .collect();
    found.sort_by(|a, b| b.layer.cmp(&a.layer));
    found
}

/// `regions` minus `cut`. A partially covered rectangle splits into the
/// strips above, below, left and right of the overlap.
pub fn subtract_regions(regions: &[Rect], cut: &Rect) -> Vec<Rect> {
    let mut out = Vec::with_capacity(regions.len() + 3);
    for region in regions {
        if !region.overlaps(cut) {
            out.push(*region);
            continue;
        }

        let ox = region.x.max(cut.x);
        let oy = region.y.max(cut.y);
        let o_right = region.right().min(cut.right());
        let o_bottom = region.bottom().min(cut.bottom());

        if o_right - ox == region.w && o_bottom - oy == region.h {
            continue;
        }

        if region.y < oy {
            out.push(Rect::new(region.x, region.y, region.w, oy - region.y));
        }
        if region.bottom() > o_bottom {
            out.push(Rect::new(region.x, o_bottom, region.w, region.bottom() - o_bottom));
        }
        let band_y = region.y.max(oy);
        let band_h = region.bottom().min(o_bottom) - band_y;
        if region.x < ox {
            out.push(Rect::new(region.x, band_y, ox - region.x, band_h));
        }
        if region.right() > o_right {
            out.push(Rect::new(o_right, band_y, region.right() - o_right, band_h));
        }
    }
    out
}

pub fn visible_regions(card: &Card, deck: &Deck, grid: &GridIndex) -> Vec<Rect> {
    if card.removed {
        return Vec::new();
    }
    let mut regions = vec![card.rect()];
    for upper in occluders(card, deck, grid) {
        regions = subtract_regions(&regions, &upper.rect());
        if regions.is_empty() {
            break;
        }
    }
    regions
}

/// Share of the unit square covered by `regions`
pub fn area_ratio(regions: &[Rect]) -> f64 {
    regions.iter().map(Rect::area).sum()
}

pub fn contains_point(regions: &[Rect], x: f64, y: f64) -> bool {
    regions.iter().any(|r| r.contains(x, y))
}

/// Reset and recompute every card. Returns the visible cards in deck order.
pub fn recompute_all(deck: &mut Deck, grid: &GridIndex) -> Vec<CardId> {
    let current: &Deck = deck;
    let computed: Vec<Option<Vec<Rect>>> = current
        .iter()
        .map(|card| (!card.removed).then(|| visible_regions(card, current, grid)))
        .collect();

    let mut visible = Vec::new();
    for (card, regions) in deck.iter_mut().zip(computed) {
        card.clear_visibility();
        let Some(regions) = regions else { continue };
        card.visible_area_ratio = area_ratio(&regions);
        card.visible = !regions.is_empty() && card.visible_area_ratio > 0.0;
        card.visible_regions = regions;
        if card.visible {
            visible.push(card.id);
        }
    }
    visible
}
