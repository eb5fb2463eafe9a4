//! Game settings and preferences
//!
//! Two layers: the string-keyed `SettingsStore` the game reads and writes
//! individual values through (`high_score`, `settings`, `high_scores`), and
//! the typed `Settings` preferences stored under one of those keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;

use crate::persistence::StoreError;

/// Key for the best score ever reached
pub const HIGH_SCORE_KEY: &str = "high_score";
/// Key for the typed preferences
pub const SETTINGS_KEY: &str = "settings";

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    pub music_enabled: bool,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub sfx_enabled: bool,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Display ===
    pub fullscreen: bool,
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_enabled: true,
            music_volume: 0.7,
            sfx_enabled: true,
            sfx_volume: 1.0,
            fullscreen: false,
            show_fps: false,
        }
    }
}

impl Settings {
    /// Clamp volumes into range
    pub fn sanitized(mut self) -> Self {
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self
    }

    /// Read from a store, falling back to defaults on anything unreadable
    pub fn load(store: &dyn SettingsStore) -> Self {
        let value = store.get(SETTINGS_KEY, Value::Null);
        if value.is_null() {
            log::info!("Using default settings");
            return Self::default();
        }
        match serde_json::from_value::<Settings>(value) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                log::warn!("Settings unreadable ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), StoreError> {
        store.set(SETTINGS_KEY, serde_json::to_value(self)?)
    }
}

/// String-keyed preference storage
pub trait SettingsStore {
    /// Value under `key`, or `default` when absent
    fn get(&self, key: &str, default: Value) -> Value;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    fn get_u64(&self, key: &str, default: u64) -> u64 {
        self.get(key, Value::from(default)).as_u64().unwrap_or(default)
    }
}

/// In-memory settings, for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: Map<String, Value>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings kept as a single JSON object on disk, rewritten on every `set`
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonSettingsStore {
    /// Open (or start) the settings file. A corrupt file is logged and
    /// replaced by an empty map.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(values) => {
                    log::info!("Loaded settings from {}", path.display());
                    values
                }
                Err(e) => {
                    log::warn!("Settings file {} is corrupt: {}", path.display(), e);
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, values }
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}
