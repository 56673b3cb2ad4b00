//! Card game presets and tunables

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Difficulty preset name. Also part of the daily seed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyKey {
    Debug,
    #[default]
    Easy,
    Normal,
    Hard,
}

impl DifficultyKey {
    pub const ALL: [DifficultyKey; 4] = [
        DifficultyKey::Debug,
        DifficultyKey::Easy,
        DifficultyKey::Normal,
        DifficultyKey::Hard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyKey::Debug => "debug",
            DifficultyKey::Easy => "easy",
            DifficultyKey::Normal => "normal",
            DifficultyKey::Hard => "hard",
        }
    }

    pub fn layout(self) -> LayoutConfig {
        LayoutConfig::preset(self)
    }
}

impl fmt::Display for DifficultyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDifficultyKeyError(String);

impl fmt::Display for ParseDifficultyKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown difficulty '{}' (expected debug, easy, normal or hard)",
            self.0
        )
    }
}

impl std::error::Error for ParseDifficultyKeyError {}

impl FromStr for DifficultyKey {
    type Err = ParseDifficultyKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(DifficultyKey::Debug),
            "easy" => Ok(DifficultyKey::Easy),
            "normal" => Ok(DifficultyKey::Normal),
            "hard" => Ok(DifficultyKey::Hard),
            _ => Err(ParseDifficultyKeyError(s.to_string())),
        }
    }
}

/// Pile geometry and slot capacity for one preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub layers: u32,
    pub rows: u32,
    pub cols: u32,
    pub card_types: u32,
    /// Nominal per-type count. Informational; generation allocates from the
    /// position count instead.
    pub cards_per_type: u32,
    pub max_slot: usize,
}

impl LayoutConfig {
    pub const fn preset(key: DifficultyKey) -> Self {
        let (layers, rows, cols, card_types, cards_per_type) = match key {
            DifficultyKey::Debug => (2, 2, 2, 3, 6),
            DifficultyKey::Easy => (3, 3, 3, 3, 9),
            DifficultyKey::Normal => (4, 9, 7, 16, 15),
            DifficultyKey::Hard => (5, 9, 7, 16, 24),
        };
        Self {
            layers,
            rows,
            cols,
            card_types,
            cards_per_type,
            max_slot: 7,
        }
    }

    /// Positions sampled per layer
    pub fn cards_per_layer(&self, density: f64) -> usize {
        (f64::from(self.rows * self.cols) * density).floor() as usize
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::preset(DifficultyKey::default())
    }
}

/// Remaining uses of each tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCounts {
    pub remove: u32,
    pub undo: u32,
    pub shuffle: u32,
    pub hint: u32,
}

impl Default for ToolCounts {
    fn default() -> Self {
        Self {
            remove: 3,
            undo: 3,
            shuffle: 1,
            hint: 3,
        }
    }
}

/// Everything a new card game is built from
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub difficulty: DifficultyKey,
    pub layout: LayoutConfig,
    /// Mirror each layer left to right instead of sampling freely
    pub symmetric_layout: bool,
    pub tools: ToolCounts,
    /// Desired deck size; the generator settles for less when positions run out
    pub card_range: RangeInclusive<usize>,
    pub match_score: u32,
    /// Minimum visible area for a card to be selectable
    pub clickable_threshold: f64,
    /// Share of a layer's cells that receive a card
    pub layer_density: f64,
}

impl GameConfig {
    pub fn for_difficulty(difficulty: DifficultyKey) -> Self {
        Self {
            difficulty,
            layout: LayoutConfig::preset(difficulty),
            ..Self::default()
        }
    }

    pub fn with_symmetric_layout(mut self, symmetric: bool) -> Self {
        self.symmetric_layout = symmetric;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let difficulty = DifficultyKey::default();
        Self {
            difficulty,
            layout: LayoutConfig::preset(difficulty),
            symmetric_layout: true,
            tools: ToolCounts::default(),
            card_range: 210..=240,
            match_score: 100,
            clickable_threshold: 0.99,
            layer_density: 0.6,
        }
    }
}
