//! Persisted high score, settings and statistics
//!
//! Values are stored as JSON strings under fixed keys. Every loader falls
//! back to the default when a value is missing, unreadable or corrupt; a
//! storage failure never reaches game logic.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::config::DifficultyKey;

pub const HIGH_SCORE_KEY: &str = "sheep_game_high_score";
pub const SETTINGS_KEY: &str = "sheep_game_settings";
pub const STATS_KEY: &str = "sheep_game_stats";

pub const ALL_KEYS: [&str; 3] = [HIGH_SCORE_KEY, SETTINGS_KEY, STATS_KEY];

#[derive(Debug)]
pub enum StorageError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O failed: {e}"),
            StorageError::Json(e) => write!(f, "stored value is not valid JSON: {e}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// String key/value persistence
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: FxHashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn try_load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(raw) if !raw.trim().is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
        _ => Ok(None),
    }
}

/// Stored value under `key`, or `default` if absent or unreadable
pub fn load_or<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    match try_load(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => default,
        Err(e) => {
            warn!(key, error = %e, "failed to load stored value, using default");
            default
        }
    }
}

/// Store `value` under `key`; failures are logged and reported as `false`
pub fn save<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|raw| store.set(key, &raw));
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(key, error = %e, "failed to save value");
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub sound_enabled: bool,
    pub difficulty: DifficultyKey,
    pub celebration_text: String,
    pub symmetric_layout: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            difficulty: DifficultyKey::default(),
            celebration_text: "❤".to_string(),
            symmetric_layout: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_score: u64,
}

impl Stats {
    pub fn record(&mut self, victory: bool, score: u32) {
        self.games_played += 1;
        if victory {
            self.games_won += 1;
        }
        self.total_score += u64::from(score);
    }

    /// Won share in percent, 0 before the first game
    pub fn win_rate(&self) -> u32 {
        if self.games_played == 0 {
            0
        } else {
            (f64::from(self.games_won) * 100.0 / f64::from(self.games_played)).round() as u32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScore(pub u32);

impl HighScore {
    /// Raise the record if `score` beats it
    pub fn submit(&mut self, score: u32) -> bool {
        if score > self.0 {
            self.0 = score;
            true
        } else {
            false
        }
    }
}

/// Everything persisted for one player, bound to its store
pub struct Profile<S: KeyValueStore> {
    store: S,
    pub high_score: HighScore,
    pub settings: Settings,
    pub stats: Stats,
}

impl<S: KeyValueStore> Profile<S> {
    pub fn load(store: S) -> Self {
        let high_score = load_or(&store, HIGH_SCORE_KEY, HighScore::default());
        let settings = load_or(&store, SETTINGS_KEY, Settings::default());
        let stats = load_or(&store, STATS_KEY, Stats::default());
        Self {
            store,
            high_score,
            settings,
            stats,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fold a finished game into the stats and the high score. Returns
    /// whether the score is a new record.
    pub fn record_game(&mut self, victory: bool, score: u32) -> bool {
        self.stats.record(victory, score);
        save(&mut self.store, STATS_KEY, &self.stats);
        let new_record = self.high_score.submit(score);
        if new_record {
            save(&mut self.store, HIGH_SCORE_KEY, &self.high_score);
        }
        new_record
    }

    pub fn save_settings(&mut self) -> bool {
        if self.settings.celebration_text.is_empty() {
            self.settings.celebration_text = Settings::default().celebration_text;
        }
        save(&mut self.store, SETTINGS_KEY, &self.settings)
    }

    /// Wipe every stored key and reset in-memory values
    pub fn clear_all(&mut self) {
        for key in ALL_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "failed to remove stored value");
            }
        }
        self.high_score = HighScore::default();
        self.settings = Settings::default();
        self.stats = Stats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let profile = Profile::load(MemoryStore::new());
        assert_eq!(profile.high_score, HighScore(0));
        assert_eq!(profile.settings, Settings::default());
        assert_eq!(profile.stats, Stats::default());
        assert_eq!(profile.settings.difficulty, DifficultyKey::Easy);
    }

    #[test]
    fn test_defaults_when_corrupt() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "not json").unwrap();
        store.set(SETTINGS_KEY, "{\"soundEnabled\": ").unwrap();
        store.set(STATS_KEY, "").unwrap();
        let profile = Profile::load(store);
        assert_eq!(profile.high_score, HighScore(0));
        assert_eq!(profile.settings, Settings::default());
        assert_eq!(profile.stats, Stats::default());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"soundEnabled":false,"difficulty":"hard"}"#)
            .unwrap();
        let profile = Profile::load(store);
        assert!(!profile.settings.sound_enabled);
        assert_eq!(profile.settings.difficulty, DifficultyKey::Hard);
        assert_eq!(profile.settings.celebration_text, "❤");
        assert!(profile.settings.symmetric_layout);
    }

    #[test]
    fn test_record_game_round_trip() {
        let mut profile = Profile::load(MemoryStore::new());
        assert!(profile.record_game(true, 500));
        assert!(!profile.record_game(false, 300));
        assert_eq!(profile.stats.games_played, 2);
        assert_eq!(profile.stats.games_won, 1);
        assert_eq!(profile.stats.total_score, 800);
        assert_eq!(profile.stats.win_rate(), 50);

        let reloaded = Profile::load(profile.store().clone());
        assert_eq!(reloaded.high_score, HighScore(500));
        assert_eq!(reloaded.stats, profile.stats);
        let raw = reloaded.store().get(STATS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"gamesPlayed\":2"));
    }

    #[test]
    fn test_clear_all() {
        let mut profile = Profile::load(MemoryStore::new());
        profile.settings.difficulty = DifficultyKey::Normal;
        assert!(profile.save_settings());
        profile.record_game(true, 100);
        assert_eq!(profile.store().len(), 3);

        profile.clear_all();
        assert!(profile.store().is_empty());
        assert_eq!(profile.settings, Settings::default());
        assert_eq!(profile.high_score, HighScore(0));
    }

    #[test]
    fn test_file_store() {
        let dir = std::env::temp_dir().join(format!("game_hall_store_{}", std::process::id()));
        let mut store = FileStore::new(&dir);
        assert_eq!(store.get("missing").unwrap(), None);
        store.set("k", "42").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("42"));
        assert_eq!(load_or(&store, "k", 0u32), 42);
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(load_or(&store, "k", 7u32), 7);
        let _ = fs::remove_dir_all(store.dir());
    }
}
