//! Card game state machine: selection, slot matching and tools
//!
//! Cards leave the pile into the slot, where three of a type clear each
//! other. The game is won when the pile and the slot are both empty and
//! lost when the slot is full with no triple in it. Every refused action
//! returns [`Rejected`] and leaves the state untouched apart from the
//! status message.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use super::card::{Card, CardId};
use super::config::{GameConfig, ToolCounts};
use super::deck::{generate_deck, Deck, GenerationReport};
use super::grid::GridIndex;
use super::rng::{date_seed, today_seed};
use super::visibility::{contains_point, recompute_all};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Remove,
    Undo,
    Shuffle,
    Hint,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tool::Remove => "remove",
            Tool::Undo => "undo",
            Tool::Shuffle => "shuffle",
            Tool::Hint => "hint",
        })
    }
}

/// Why an action was a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    GameOver,
    SlotFull,
    /// Unknown id or already off the pile
    CardUnavailable,
    /// Completely covered
    NotVisible,
    OutsideVisibleRegion,
    /// Partly covered cards show but cannot be picked up
    NotFullyVisible,
    ToolExhausted(Tool),
    NotEnoughSlotCards,
    NothingToUndo,
    NothingVisible,
    NoHint,
    BadIndex,
    RemovedAreaEmpty,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejected::GameOver => write!(f, "the game is over"),
            Rejected::SlotFull => write!(f, "the slot is full"),
            Rejected::CardUnavailable => write!(f, "that card is not on the pile"),
            Rejected::NotVisible => write!(f, "that card is covered"),
            Rejected::OutsideVisibleRegion => write!(f, "the click missed the visible part of the card"),
            Rejected::NotFullyVisible => write!(f, "that card is partly covered"),
            Rejected::ToolExhausted(tool) => write!(f, "no {tool} uses left"),
            Rejected::NotEnoughSlotCards => write!(f, "at least 3 cards must be in the slot"),
            Rejected::NothingToUndo => write!(f, "nothing to undo"),
            Rejected::NothingVisible => write!(f, "no cards to shuffle"),
            Rejected::NoHint => write!(f, "no card completes a pair in the slot"),
            Rejected::BadIndex => write!(f, "no card at that position in the removed area"),
            Rejected::RemovedAreaEmpty => write!(f, "the removed area is empty"),
        }
    }
}

impl std::error::Error for Rejected {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Playing,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Warning,
}

/// Transient feedback for the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
}

/// Reversible action. Each record holds what undo needs to put the slot
/// and the removed area back exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRecord {
    Select { card: CardId, slot_before: Vec<CardId> },
    Remove { cards: Vec<CardId>, removed_before: Vec<CardId> },
    Restore { card: CardId, index: usize, slot_before: Vec<CardId> },
    ClearRemoved { cards: Vec<CardId> },
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    record: MoveRecord,
    score_before: u32,
}

#[derive(Debug, Clone)]
pub struct CardGame {
    config: GameConfig,
    deck: Deck,
    grid: GridIndex,
    /// Cards with any visible area, deck order
    visible: Vec<CardId>,
    slot: Vec<CardId>,
    removed_area: Vec<CardId>,
    history: Vec<HistoryEntry>,
    score: u32,
    move_count: u32,
    tools: ToolCounts,
    status: Status,
    message: Option<StatusMessage>,
    report: Option<GenerationReport>,
    rng: ChaCha8Rng,
}

impl CardGame {
    /// Deal a deck from a layout seed
    pub fn new(config: GameConfig, seed: u32, mut rng: ChaCha8Rng) -> Self {
        let (deck, report) = generate_deck(&config, seed, &mut rng);
        let mut game = Self::from_deck(config, deck, rng);
        game.report = Some(report);
        game
    }

    /// The shared deck for `date` at the configured difficulty
    pub fn daily(config: GameConfig, date: NaiveDate) -> Self {
        let seed = date_seed(date, Some(config.difficulty));
        Self::new(config, seed, ChaCha8Rng::from_entropy())
    }

    pub fn today(config: GameConfig) -> Self {
        let seed = today_seed(config.difficulty);
        Self::new(config, seed, ChaCha8Rng::from_entropy())
    }

    /// Start a game on a prepared deck
    pub fn from_deck(config: GameConfig, deck: Deck, rng: ChaCha8Rng) -> Self {
        let mut grid = GridIndex::new(config.layout.rows, config.layout.cols);
        grid.rebuild(&deck);
        let tools = config.tools;
        let mut game = Self {
            config,
            deck,
            grid,
            visible: Vec::new(),
            slot: Vec::new(),
            removed_area: Vec::new(),
            history: Vec::new(),
            score: 0,
            move_count: 0,
            tools,
            status: Status::Playing,
            message: None,
            report: None,
            rng,
        };
        game.refresh_visibility();
        game.notify(MessageKind::Success, "game started, clear every card to win");
        game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.deck.get(id)
    }

    pub fn visible_cards(&self) -> &[CardId] {
        &self.visible
    }

    /// Visible cards that can be picked up right now
    pub fn selectable_cards(&self) -> Vec<CardId> {
        let threshold = self.config.clickable_threshold;
        self.visible
            .iter()
            .copied()
            .filter(|&id| self.deck.get(id).is_some_and(|c| c.is_selectable(threshold)))
            .collect()
    }

    pub fn slot(&self) -> &[CardId] {
        &self.slot
    }

    pub fn slot_types(&self) -> Vec<u32> {
        self.slot.iter().filter_map(|&id| self.deck.type_of(id)).collect()
    }

    pub fn removed_area(&self) -> &[CardId] {
        &self.removed_area
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn tools(&self) -> ToolCounts {
        self.tools
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != Status::Playing
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn report(&self) -> Option<&GenerationReport> {
        self.report.as_ref()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Pick a card off the pile. Returns the number of triples cleared.
    pub fn select_card(&mut self, id: CardId) -> Result<usize, Rejected> {
        self.select(id, None)
    }

    /// Pick a card by a click at grid coordinates `(x, y)`, which must land
    /// on the visible part of the card.
    pub fn select_card_at(&mut self, id: CardId, x: f64, y: f64) -> Result<usize, Rejected> {
        self.select(id, Some((x, y)))
    }

    fn select(&mut self, id: CardId, click: Option<(f64, f64)>) -> Result<usize, Rejected> {
        if self.is_over() {
            return self.reject(Rejected::GameOver);
        }
        if self.slot.len() >= self.config.layout.max_slot {
            return self.reject(Rejected::SlotFull);
        }
        let threshold = self.config.clickable_threshold;
        let check = match self.deck.get(id) {
            None => Err(Rejected::CardUnavailable),
            Some(card) if card.removed => Err(Rejected::CardUnavailable),
            Some(card) if card.visible_regions.is_empty() => Err(Rejected::NotVisible),
            Some(card) => match click {
                Some((x, y)) if !contains_point(&card.visible_regions, x, y) => {
                    Err(Rejected::OutsideVisibleRegion)
                }
                _ if card.visible_area_ratio < threshold => Err(Rejected::NotFullyVisible),
                _ => Ok(card.clone()),
            },
        };
        let card = match check {
            Ok(card) => card,
            Err(r) => return self.reject(r),
        };

        self.push_history(MoveRecord::Select {
            card: id,
            slot_before: self.slot.clone(),
        });
        let at = self.insert_position(card.card_type);
        self.slot.insert(at, id);
        if let Some(c) = self.deck.get_mut(id) {
            c.removed = true;
        }
        self.move_count += 1;
        self.grid.remove(&card);
        self.refresh_visibility();
        debug!(card = id, card_type = card.card_type, slot = self.slot.len(), "card selected");

        let cleared = self.check_for_matches();
        self.check_game_state();
        Ok(cleared)
    }

    /// Slot index right after the last card of `card_type`, or the end
    pub fn insert_position(&self, card_type: u32) -> usize {
        self.slot
            .iter()
            .rposition(|&id| self.deck.type_of(id) == Some(card_type))
            .map_or(self.slot.len(), |i| i + 1)
    }

    /// Clear the earliest three of any type with three or more in the slot,
    /// lowest type first, until none is left. Returns the triples cleared.
    pub fn check_for_matches(&mut self) -> usize {
        let mut cleared = 0;
        while let Some(card_type) = self.triple_type() {
            let mut taken = 0;
            let deck = &self.deck;
            self.slot.retain(|&id| {
                if taken < 3 && deck.type_of(id) == Some(card_type) {
                    taken += 1;
                    false
                } else {
                    true
                }
            });
            self.score += self.config.match_score;
            cleared += 1;
            self.notify(
                MessageKind::Success,
                format!("match cleared, +{} points", self.config.match_score),
            );
            debug!(card_type, score = self.score, "triple cleared");
        }
        cleared
    }

    fn slot_type_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for t in self.slot_types() {
            *counts.entry(t).or_insert(0) += 1;
        }
        counts
    }

    fn triple_type(&self) -> Option<u32> {
        self.slot_type_counts()
            .into_iter()
            .find(|&(_, n)| n >= 3)
            .map(|(t, _)| t)
    }

    /// Whether any type in the slot already has three cards
    pub fn can_make_match(&self) -> bool {
        self.triple_type().is_some()
    }

    /// Settle victory or defeat after a change to the slot
    pub fn check_game_state(&mut self) -> Status {
        if self.deck.all_removed() && self.slot.is_empty() {
            self.status = Status::Victory;
            info!(score = self.score, moves = self.move_count, "card game won");
        } else if self.slot.len() >= self.config.layout.max_slot && !self.can_make_match() {
            self.status = Status::Defeat;
            info!(score = self.score, moves = self.move_count, "card game lost, slot full");
        }
        self.status
    }

    /// Move the first three slot cards into the removed area
    pub fn use_remove_tool(&mut self) -> Result<(), Rejected> {
        self.ready(Tool::Remove, self.tools.remove)?;
        if self.slot.len() < 3 {
            return self.reject(Rejected::NotEnoughSlotCards);
        }
        let cards: Vec<CardId> = self.slot.drain(..3).collect();
        self.push_history(MoveRecord::Remove {
            cards: cards.clone(),
            removed_before: self.removed_area.clone(),
        });
        self.removed_area.extend(cards);
        self.tools.remove -= 1;
        self.notify(
            MessageKind::Success,
            format!("moved 3 cards to the removed area ({} there)", self.removed_area.len()),
        );
        Ok(())
    }

    /// Put the card at `index` of the removed area back into the slot
    pub fn restore_from_removed(&mut self, index: usize) -> Result<usize, Rejected> {
        if self.is_over() {
            return self.reject(Rejected::GameOver);
        }
        let Some(&id) = self.removed_area.get(index) else {
            return self.reject(Rejected::BadIndex);
        };
        if self.slot.len() >= self.config.layout.max_slot {
            return self.reject(Rejected::SlotFull);
        }
        let Some(card_type) = self.deck.type_of(id) else {
            return self.reject(Rejected::CardUnavailable);
        };

        self.push_history(MoveRecord::Restore {
            card: id,
            index,
            slot_before: self.slot.clone(),
        });
        self.removed_area.remove(index);
        let at = self.insert_position(card_type);
        self.slot.insert(at, id);
        self.notify(MessageKind::Success, "card returned to the slot");

        let cleared = self.check_for_matches();
        self.check_game_state();
        Ok(cleared)
    }

    /// Empty the removed area. Undoable.
    pub fn clear_removed(&mut self) -> Result<(), Rejected> {
        if self.is_over() {
            return self.reject(Rejected::GameOver);
        }
        if self.removed_area.is_empty() {
            return self.reject(Rejected::RemovedAreaEmpty);
        }
        let cards = std::mem::take(&mut self.removed_area);
        self.push_history(MoveRecord::ClearRemoved { cards });
        self.notify(MessageKind::Success, "removed area cleared");
        Ok(())
    }

    /// Revert the latest recorded action, score included
    pub fn use_undo_tool(&mut self) -> Result<(), Rejected> {
        if self.tools.undo == 0 {
            return self.reject(Rejected::ToolExhausted(Tool::Undo));
        }
        if self.history.is_empty() {
            return self.reject(Rejected::NothingToUndo);
        }
        if self.is_over() {
            return self.reject(Rejected::GameOver);
        }
        let Some(entry) = self.history.pop() else {
            return self.reject(Rejected::NothingToUndo);
        };

        match entry.record {
            MoveRecord::Select { card, slot_before } => {
                if let Some(c) = self.deck.get_mut(card) {
                    c.removed = false;
                }
                self.slot = slot_before;
                self.move_count = self.move_count.saturating_sub(1);
            }
            MoveRecord::Remove { cards, removed_before } => {
                self.removed_area = removed_before;
                let rest = std::mem::take(&mut self.slot);
                self.slot = cards;
                self.slot.extend(rest);
            }
            MoveRecord::Restore { card, index, slot_before } => {
                self.slot = slot_before;
                let at = index.min(self.removed_area.len());
                self.removed_area.insert(at, card);
            }
            MoveRecord::ClearRemoved { cards } => {
                self.removed_area = cards;
            }
        }
        self.score = entry.score_before;
        self.tools.undo -= 1;
        self.grid.rebuild(&self.deck);
        self.refresh_visibility();
        self.notify(MessageKind::Success, "last action undone");
        Ok(())
    }

    /// Permute the types of the visible cards among themselves
    pub fn use_shuffle_tool(&mut self) -> Result<(), Rejected> {
        self.ready(Tool::Shuffle, self.tools.shuffle)?;
        if self.visible.is_empty() {
            return self.reject(Rejected::NothingVisible);
        }
        let mut types: Vec<u32> = self.visible.iter().filter_map(|&id| self.deck.type_of(id)).collect();
        types.shuffle(&mut self.rng);
        for (&id, t) in self.visible.iter().zip(types) {
            if let Some(card) = self.deck.get_mut(id) {
                card.card_type = t;
            }
        }
        self.tools.shuffle -= 1;
        self.refresh_visibility();
        self.notify(MessageKind::Success, "visible cards reshuffled");
        Ok(())
    }

    /// Up to three visible cards whose type has exactly two in the slot
    pub fn find_hint_cards(&self) -> Vec<CardId> {
        let pairs: Vec<u32> = self
            .slot_type_counts()
            .into_iter()
            .filter(|&(_, n)| n == 2)
            .map(|(t, _)| t)
            .collect();
        self.visible
            .iter()
            .copied()
            .filter(|&id| self.deck.type_of(id).is_some_and(|t| pairs.contains(&t)))
            .take(3)
            .collect()
    }

    pub fn use_hint_tool(&mut self) -> Result<Vec<CardId>, Rejected> {
        self.ready(Tool::Hint, self.tools.hint)?;
        let hint = self.find_hint_cards();
        if hint.is_empty() {
            return self.reject(Rejected::NoHint);
        }
        self.tools.hint -= 1;
        self.notify(MessageKind::Success, "highlighted cards that complete a pair");
        Ok(hint)
    }

    fn ready(&mut self, tool: Tool, uses: u32) -> Result<(), Rejected> {
        if uses == 0 {
            return self.reject(Rejected::ToolExhausted(tool));
        }
        if self.is_over() {
            return self.reject(Rejected::GameOver);
        }
        Ok(())
    }

    fn push_history(&mut self, record: MoveRecord) {
        self.history.push(HistoryEntry {
            record,
            score_before: self.score,
        });
    }

    fn refresh_visibility(&mut self) {
        self.visible = recompute_all(&mut self.deck, &self.grid);
    }

    fn notify(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.message = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn reject<T>(&mut self, reason: Rejected) -> Result<T, Rejected> {
        debug!(%reason, "card action refused");
        self.notify(MessageKind::Warning, reason.to_string());
        Err(reason)
    }
}
