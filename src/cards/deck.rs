//! Deck storage and daily deck generation
//!
//! Positions come from the date-seeded [`Mulberry32`], so everyone playing
//! the same difficulty on the same day gets the same pile. Which type lands
//! on which position is shuffled with the caller's session rng, so replays
//! of the same day still differ.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info, warn};

use super::card::{Card, CardId};
use super::config::{GameConfig, LayoutConfig};
use super::rng::Mulberry32;

/// A generated slot in the pile, before a type is assigned
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub layer: u32,
    pub row: f64,
    pub col: f64,
}

impl Position {
    fn key(&self) -> (u32, u32, u32) {
        // coordinates are whole or half cells
        (self.layer, (self.row * 2.0) as u32, (self.col * 2.0) as u32)
    }
}

/// Cards in placement order with an id lookup
#[derive(Debug, Clone, Default)]
pub struct Deck {
    cards: Vec<Card>,
    index: FxHashMap<CardId, usize>,
}

impl Deck {
    pub fn from_cards(cards: Vec<Card>) -> Self {
        let index = cards.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
        Self { cards, index }
    }

    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.index.get(&id).map(|&i| &self.cards[i])
    }

    pub fn get_mut(&mut self, id: CardId) -> Option<&mut Card> {
        match self.index.get(&id) {
            Some(&i) => self.cards.get_mut(i),
            None => None,
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Card> {
        self.cards.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Card> {
        self.cards.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards still on the pile
    pub fn remaining(&self) -> usize {
        self.cards.iter().filter(|c| !c.removed).count()
    }

    pub fn all_removed(&self) -> bool {
        self.cards.iter().all(|c| c.removed)
    }

    pub fn type_of(&self, id: CardId) -> Option<u32> {
        self.get(id).map(|c| c.card_type)
    }

    pub fn type_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for card in &self.cards {
            *counts.entry(card.card_type).or_insert(0) += 1;
        }
        counts
    }

    pub fn layer_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for card in &self.cards {
            *counts.entry(card.layer).or_insert(0) += 1;
        }
        counts
    }

    /// Drop cards so every type count is a multiple of three. The earliest
    /// cards of an offending type go first, which are the lowest layers.
    /// Returns how many cards were dropped.
    pub fn trim_to_triplets(&mut self) -> usize {
        let mut trimmed = 0;
        for (card_type, count) in self.type_counts() {
            let excess = count % 3;
            if excess == 0 {
                continue;
            }
            warn!(card_type, count, excess, "card type count not a multiple of 3, trimming");
            let mut left = excess;
            self.cards.retain(|c| {
                if left > 0 && c.card_type == card_type {
                    left -= 1;
                    false
                } else {
                    true
                }
            });
            trimmed += excess;
        }
        if trimmed > 0 {
            *self = Self::from_cards(std::mem::take(&mut self.cards));
        }
        trimmed
    }
}

/// Summary of one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub seed: u32,
    pub available_positions: usize,
    pub target_total: usize,
    pub placed: usize,
    pub trimmed: usize,
    /// Final deck size falls inside the configured range
    pub meets_range: bool,
}

/// Free sampling: each layer draws `cards_per_layer` cells on the
/// `(rows - 1) x (cols - 1)` lattice and drops repeats.
pub fn pyramid_positions(layout: &LayoutConfig, density: f64, rng: &mut Mulberry32) -> Vec<Position> {
    let per_layer = layout.cards_per_layer(density);
    let span_r = layout.rows.saturating_sub(1) as usize;
    let span_c = layout.cols.saturating_sub(1) as usize;
    let mut seen = FxHashSet::default();
    let mut positions = Vec::new();

    for layer in 0..layout.layers {
        let offset = layer_offset(layer, rng);
        for _ in 0..per_layer {
            let row = rng.below(span_r) as f64 + offset;
            let col = rng.below(span_c) as f64 + offset;
            let pos = Position { layer, row, col };
            if seen.insert(pos.key()) {
                positions.push(pos);
            }
        }
    }
    positions
}

/// Mirrored sampling: shuffle the left half of each layer and place every
/// pick together with its mirror across the middle column.
pub fn symmetric_positions(layout: &LayoutConfig, density: f64, rng: &mut Mulberry32) -> Vec<Position> {
    let per_layer = layout.cards_per_layer(density);
    let rows = f64::from(layout.rows);
    let last_col = f64::from(layout.cols) - 1.0;
    let mid_col = last_col / 2.0;
    let mut positions = Vec::new();

    for layer in 0..layout.layers {
        let offset = layer_offset(layer, rng);

        let mut left = Vec::new();
        for r in 0..layout.rows {
            let row = f64::from(r) + offset;
            if row >= rows {
                continue;
            }
            let mut c = 0.0;
            while c <= mid_col {
                let col = c + offset;
                if col <= mid_col {
                    left.push(Position { layer, row, col });
                }
                c += 1.0;
            }
        }
        rng.shuffle(&mut left);

        let mut picked = Vec::with_capacity(per_layer);
        for pos in left {
            if picked.len() >= per_layer {
                break;
            }
            picked.push(pos);
            let mirror = last_col - pos.col;
            if mirror != pos.col && picked.len() < per_layer {
                picked.push(Position { col: mirror, ..pos });
            }
        }
        picked.truncate(per_layer);
        positions.extend(picked);
    }
    positions
}

/// Upper layers are shifted by half a cell on a coin flip
fn layer_offset(layer: u32, rng: &mut Mulberry32) -> f64 {
    if layer > 0 && rng.next_f64() > 0.5 {
        0.5
    } else {
        0.0
    }
}

/// Largest multiple of three within the range cap and the position count
pub fn target_total(available: usize, max_total: usize) -> usize {
    let total = available.min(max_total);
    total - total % 3
}

/// Type of every card to place: `target / 3` triplets spread evenly, the
/// first types taking one extra triplet each until the remainder is spent.
pub fn allocate_types(target: usize, card_types: u32) -> Vec<u32> {
    if card_types == 0 {
        return Vec::new();
    }
    let triplets = target / 3;
    let base = triplets / card_types as usize;
    let mut extra = triplets - base * card_types as usize;
    let mut types = Vec::with_capacity(target);
    for t in 0..card_types {
        let mut n = base;
        if extra > 0 {
            n += 1;
            extra -= 1;
        }
        types.extend(std::iter::repeat(t).take(n * 3));
    }
    types.truncate(target);
    types
}

/// Build the deck for `config` from the layout seed. `session` only decides
/// which type goes where.
pub fn generate_deck<R: Rng + ?Sized>(
    config: &GameConfig,
    seed: u32,
    session: &mut R,
) -> (Deck, GenerationReport) {
    let mut layout_rng = Mulberry32::new(seed);
    let positions = if config.symmetric_layout {
        symmetric_positions(&config.layout, config.layer_density, &mut layout_rng)
    } else {
        pyramid_positions(&config.layout, config.layer_density, &mut layout_rng)
    };
    let available = positions.len();

    let min_total = *config.card_range.start();
    let target = target_total(available, *config.card_range.end());
    if target < min_total {
        warn!(
            available,
            target,
            min_total,
            "not enough positions for the requested card count, using the largest multiple of 3"
        );
    }

    let mut types = allocate_types(target, config.layout.card_types);
    types.shuffle(session);

    let cards: Vec<Card> = positions
        .iter()
        .zip(types)
        .enumerate()
        .map(|(i, (pos, card_type))| Card::new(i as CardId, card_type, pos.layer, pos.row, pos.col))
        .collect();
    let placed = cards.len();

    let mut deck = Deck::from_cards(cards);
    let trimmed = deck.trim_to_triplets();
    debug!(type_counts = ?deck.type_counts(), "deck type counts");

    let report = GenerationReport {
        seed,
        available_positions: available,
        target_total: target,
        placed,
        trimmed,
        meets_range: config.card_range.contains(&deck.len()),
    };
    info!(
        difficulty = %config.difficulty,
        seed,
        cards = deck.len(),
        available,
        symmetric = config.symmetric_layout,
        "deck generated"
    );
    (deck, report)
}
