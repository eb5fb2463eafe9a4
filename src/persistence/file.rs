//! JSON save file with a versioned envelope and one backup

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::{SaveData, SaveStore, StoreError};

pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    data: SaveData,
}

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `savegame.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join("savegame.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.bak")
    }

    fn read(path: &Path) -> Result<Option<SaveData>, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let envelope: Envelope = serde_json::from_str(&text)?;
        if envelope.version != SAVE_VERSION {
            return Err(StoreError::Version {
                found: envelope.version,
                expected: SAVE_VERSION,
            });
        }
        Ok(Some(envelope.data.sanitized()))
    }
}

impl SaveStore for JsonFileStore {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let envelope = Envelope {
            version: SAVE_VERSION,
            data: *data,
        };
        let tmp = self.tmp_path();
        fs::write(&tmp, serde_json::to_string_pretty(&envelope)?)?;
        if self.path.exists() {
            fs::rename(&self.path, self.backup_path())?;
        }
        fs::rename(&tmp, &self.path)?;
        log::debug!("Saved {:?} to {}", data, self.path.display());
        Ok(())
    }

    /// Falls back to the backup when the main file is corrupt
    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        match Self::read(&self.path) {
            Ok(data) => Ok(data),
            Err(e) => {
                log::warn!("Save file {} unreadable: {}", self.path.display(), e);
                match Self::read(&self.backup_path()) {
                    Ok(Some(data)) => {
                        log::info!("Recovered progress from backup");
                        Ok(Some(data))
                    }
                    _ => Err(e),
                }
            }
        }
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        for path in [self.path.clone(), self.backup_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> JsonFileStore {
        let dir = std::env::temp_dir().join(format!("orb-portal-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        JsonFileStore::in_dir(dir)
    }

    #[test]
    fn test_missing_file_is_none() {
        let store = temp_store("missing");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let mut store = temp_store("roundtrip");
        let data = SaveData {
            level: 7,
            score: 4321,
            lives: 3,
        };
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_recovers_from_backup() {
        let mut store = temp_store("backup");
        let first = SaveData {
            level: 2,
            score: 100,
            lives: 5,
        };
        store.save(&first).unwrap();
        store
            .save(&SaveData {
                level: 3,
                ..first
            })
            .unwrap();
        fs::write(store.path(), "garbage").unwrap();
        assert_eq!(store.load().unwrap(), Some(first));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let store = temp_store("version");
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{"version": 99, "data": {"level": 1, "score": 0, "lives": 5}}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load(),
            Err(StoreError::Version { found: 99, .. })
        ));
    }
}
