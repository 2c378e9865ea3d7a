use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::model::error::{PreferenceError, Result};

/// Flat key → serialized value table, the unit that is read from and written
/// to disk.
pub type RawPreferences = BTreeMap<String, String>;

pub trait PreferenceStorage {
    fn load(&self) -> Result<RawPreferences>;

    fn save(&self, values: &RawPreferences) -> Result<()>;
}

/// Stores preferences as a flat TOML table.
///
/// Hand edited files may hold integers or booleans instead of strings; those
/// are accepted and turned back into their string form on load.
#[derive(Debug, Clone)]
pub struct TomlFileStorage {
    path: PathBuf,
}

impl TomlFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn io_error(&self, source: io::Error) -> PreferenceError {
        PreferenceError::Io { path: self.path.clone(), source }
    }
}

impl PreferenceStorage for TomlFileStorage {
    fn load(&self) -> Result<RawPreferences> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no preference file yet");
                return Ok(RawPreferences::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let table: toml::Table = toml::from_str(&text)
            .map_err(|source| PreferenceError::Decode { path: self.path.clone(), source })?;

        let mut values = RawPreferences::new();
        for (key, value) in table {
            let raw = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    warn!(key = %key, kind = other.type_str(), "ignoring non-scalar preference");
                    continue;
                }
            };
            values.insert(key, raw);
        }
        Ok(values)
    }

    fn save(&self, values: &RawPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let text = toml::to_string(values)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, text).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    values: RawPreferences,
    read_only: bool,
    writes: usize,
}

/// In-memory storage. Clones share the same table, so a caller can keep a
/// handle to inspect or break the storage after handing it to a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage(Rc<RefCell<MemoryState>>);

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let storage = Self::new();
        storage.0.borrow_mut().values =
            values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        storage
    }

    /// Makes every following `save` fail as if the file were not writable.
    pub fn set_read_only(&self, read_only: bool) { self.0.borrow_mut().read_only = read_only; }

    pub fn values(&self) -> RawPreferences { self.0.borrow().values.clone() }

    pub fn writes(&self) -> usize { self.0.borrow().writes }
}

impl PreferenceStorage for MemoryStorage {
    fn load(&self) -> Result<RawPreferences> { Ok(self.0.borrow().values.clone()) }

    fn save(&self, values: &RawPreferences) -> Result<()> {
        let mut state = self.0.borrow_mut();
        if state.read_only {
            return Err(PreferenceError::Io {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "storage is read-only"),
            });
        }
        state.values = values.clone();
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlFileStorage::new(dir.path().join("preferences.toml"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TomlFileStorage::new(dir.path().join("nested").join("preferences.toml"));
        let values: RawPreferences = [("theme", "Windows 10"), ("tabKeyCode", "48")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        storage.save(&values).unwrap();
        assert_eq!(storage.load().unwrap(), values);
        assert!(!dir.path().join("nested").join("preferences.toml.tmp").exists());
    }

    #[test]
    fn scalars_are_read_as_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "maxScreenUsage = 55\nhideSpaceNumberLabels = true\nnested = [1]\n")
            .unwrap();

        let values = TomlFileStorage::new(&path).load().unwrap();
        assert_eq!(values.get("maxScreenUsage").map(String::as_str), Some("55"));
        assert_eq!(values.get("hideSpaceNumberLabels").map(String::as_str), Some("true"));
        assert!(!values.contains_key("nested"));
    }

    #[test]
    fn malformed_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "theme = ").unwrap();

        let err = TomlFileStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, PreferenceError::Decode { .. }), "{err:?}");
    }

    #[test]
    fn read_only_memory_storage_rejects_writes() {
        let storage = MemoryStorage::with_values([("theme", "macOS")]);
        storage.set_read_only(true);
        assert!(storage.save(&RawPreferences::new()).is_err());
        assert_eq!(storage.writes(), 0);
        assert_eq!(storage.values().len(), 1);

        storage.set_read_only(false);
        storage.save(&RawPreferences::new()).unwrap();
        assert_eq!(storage.writes(), 1);
        assert!(storage.values().is_empty());
    }
}
