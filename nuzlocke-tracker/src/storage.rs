use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use nuzlocke_core::{TrackerState, TrackerStorage};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access save {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("save {path} is not a tracker state")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Keeps each run as `<dir>/<save_name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Split a save file path into its storage directory and save name.
    pub fn for_save_path(path: &Path) -> Option<(Self, String)> {
        let name = path.file_stem()?.to_str()?.to_string();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Some((Self::new(dir), name))
    }

    pub fn path_for(&self, save_name: &str) -> PathBuf {
        self.dir.join(format!("{save_name}.json"))
    }
}

impl TrackerStorage for JsonFileStorage {
    type Error = StorageError;

    fn save_state(&self, save_name: &str, state: &TrackerState) -> Result<(), Self::Error> {
        let path = self.path_for(save_name);
        let json = state.to_json().map_err(|source| StorageError::Format {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Io { path, source })
    }

    fn load_state(&self, save_name: &str) -> Result<Option<TrackerState>, Self::Error> {
        let path = self.path_for(save_name);
        if !path.exists() {
            log::debug!("no save at {}", path.display());
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        TrackerState::from_json(&json)
            .map(Some)
            .map_err(|source| StorageError::Format { path, source })
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(save_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nuzlocke_core::Member;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "nuzlocke-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn save_load_delete_round_trip() {
        let storage = JsonFileStorage::new(temp_dir("round-trip"));
        assert!(storage.load_state("run").unwrap().is_none());

        let mut state = TrackerState {
            location: "Route 202".to_string(),
            ..TrackerState::default()
        };
        state.party.insert(Member::new("Route 202", "Shinx"));
        storage.save_state("run", &state).unwrap();

        let loaded = storage.load_state("run").unwrap().unwrap();
        assert_eq!(loaded, state);

        storage.delete_save("run").unwrap();
        storage.delete_save("run").unwrap();
        assert!(storage.load_state("run").unwrap().is_none());
    }

    #[test]
    fn corrupt_save_is_a_format_error() {
        let dir = temp_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("run.json"), "{ not json").unwrap();
        let storage = JsonFileStorage::new(&dir);
        assert!(matches!(
            storage.load_state("run"),
            Err(StorageError::Format { .. })
        ));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn save_path_splits_into_dir_and_name() {
        let (storage, name) = JsonFileStorage::for_save_path(Path::new("runs/platinum.json")).unwrap();
        assert_eq!(name, "platinum");
        assert_eq!(storage.path_for(&name), Path::new("runs/platinum.json"));

        let (storage, name) = JsonFileStorage::for_save_path(Path::new("solo.json")).unwrap();
        assert_eq!(storage.path_for(&name), Path::new("./solo.json"));
    }
}
