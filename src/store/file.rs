//! TOML-file-backed preference store
//!
//! Persists the flat key-value map as a TOML table. The file lives in the
//! platform config directory by default; a missing file means "no stored
//! preferences" and is not an error.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::StoreError;
use crate::store::PreferenceStore;

/// Preference store persisted to a TOML file.
///
/// Every mutation rewrites the file; the map is small (a dozen keys) so no
/// batching is needed.
pub struct TomlStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl TomlStore {
    /// Open the store at the default platform location
    /// (e.g. `~/.config/media-device-config/devices.toml` on Linux).
    pub fn open_default() -> Result<Self, StoreError> {
        let dirs = ProjectDirs::from("", "", "media-device-config")
            .ok_or(StoreError::NoProjectDir)?;
        Self::open(dirs.config_dir().join("devices.toml"))
    }

    /// Open the store at an explicit path, loading existing contents.
    /// A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = Self::load(&path)?;
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No preference file at {}, starting empty", path.display());
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let table: BTreeMap<String, toml::Value> =
            toml::from_str(&contents).map_err(|e| StoreError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(table
            .into_iter()
            .map(|(k, v)| {
                let s = match v {
                    toml::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, s)
            })
            .collect())
    }

    fn save(&self) -> Result<(), StoreError> {
        let table: BTreeMap<String, toml::Value> = self
            .values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), toml::Value::String(v.clone())))
            .collect();
        let contents =
            toml::to_string_pretty(&table).map_err(|e| StoreError::Serialize {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        fs::write(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            tracing::error!("Failed to persist preferences: {}", e);
        }
    }
}

impl PreferenceStore for TomlStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        self.save_logged();
    }

    fn remove(&self, key: &str) {
        let removed = self.values.write().remove(key).is_some();
        if removed {
            self.save_logged();
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "media-device-config-test-{}-{}.toml",
            std::process::id(),
            name
        ))
    }

    #[test]
    fn missing_file_is_empty_store() {
        let path = temp_path("missing");
        let _ = fs::remove_file(&path);

        let store = TomlStore::open(&path).unwrap();
        assert_eq!(store.get_string(keys::AUDIO_SYSTEM), None);
        assert_eq!(store.get_i32(keys::VIDEO_WIDTH, 640), 640);
    }

    #[test]
    fn persists_across_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        {
            let store = TomlStore::open(&path).unwrap();
            store.set_string(keys::AUDIO_SYSTEM, "pulseaudio");
            store.set_i32(keys::VIDEO_WIDTH, 864);
        }
        {
            let store = TomlStore::open(&path).unwrap();
            assert_eq!(store.get_string(keys::AUDIO_SYSTEM).as_deref(), Some("pulseaudio"));
            assert_eq!(store.get_i32(keys::VIDEO_WIDTH, 640), 864);

            store.remove(keys::AUDIO_SYSTEM);
        }
        {
            let store = TomlStore::open(&path).unwrap();
            assert!(!store.contains(keys::AUDIO_SYSTEM));
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let path = temp_path("malformed");
        fs::write(&path, "not [valid toml").unwrap();

        assert!(matches!(
            TomlStore::open(&path),
            Err(StoreError::Parse { .. })
        ));

        let _ = fs::remove_file(&path);
    }
}
