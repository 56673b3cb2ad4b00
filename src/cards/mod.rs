//! Daily stacked-card triple matching puzzle
//!
//! - `config`: difficulty presets, tool counts and tunables
//! - `rng`: date seed and the reproducible layout generator
//! - `card`: cards and visible-region rectangles
//! - `deck`: pyramid and mirrored layouts, type allocation, solvability trim
//! - `grid`: cell index for occlusion lookups
//! - `visibility`: rectangle subtraction and visible ratios
//! - `game`: selection, slot matching, tools and undo
//! - `storage`: high score, settings and stats persistence

pub mod card;
pub mod config;
pub mod deck;
pub mod game;
pub mod grid;
pub mod rng;
pub mod storage;
pub mod visibility;

pub use card::{Card, CardId, Rect};
pub use config::{DifficultyKey, GameConfig, LayoutConfig, ToolCounts};
pub use deck::{generate_deck, Deck, GenerationReport};
pub use game::{CardGame, MessageKind, MoveRecord, Rejected, Status, StatusMessage, Tool};
pub use grid::GridIndex;
pub use rng::{date_seed, Mulberry32};
pub use storage::{FileStore, HighScore, KeyValueStore, MemoryStore, Profile, Settings, Stats, StorageError};
