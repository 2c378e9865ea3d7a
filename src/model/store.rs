use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::common::collections::HashMap;
use crate::model::error::{PreferenceError, Result};
use crate::model::preference::{DEFINITIONS, definition};
use crate::model::settings::SwitcherSettings;
use crate::model::storage::{MemoryStorage, PreferenceStorage, RawPreferences};

/// The store is shared between the preferences window and the rest of the
/// application, all on the main thread.
pub type SharedStore = Rc<RefCell<PreferenceStore>>;

/// Current serialized value of every defined preference.
///
/// Values only enter the store through validation, so readers can rely on
/// every value parsing according to its definition.
pub struct PreferenceStore {
    values: HashMap<&'static str, String>,
    storage: Box<dyn PreferenceStorage>,
}

impl PreferenceStore {
    /// Loads persisted values, falling back to the default for anything
    /// missing or invalid.
    pub fn load(storage: impl PreferenceStorage + 'static) -> Result<Self> {
        let mut persisted = storage.load()?;
        let mut values = HashMap::default();
        for def in DEFINITIONS {
            let value = match persisted.remove(def.key) {
                Some(raw) => match def.validate(&raw) {
                    Ok(()) => raw,
                    Err(err) => {
                        warn!(key = def.key, %err, "persisted value rejected, using default");
                        def.default.to_owned()
                    }
                },
                None => def.default.to_owned(),
            };
            values.insert(def.key, value);
        }
        for key in persisted.keys() {
            debug!(key = %key, "ignoring unknown persisted preference");
        }
        Ok(Self { values, storage: Box::new(storage) })
    }

    /// A store holding only defaults, backed by throwaway memory storage.
    pub fn in_memory() -> Self {
        Self {
            values: DEFINITIONS.iter().map(|def| (def.key, def.default.to_owned())).collect(),
            storage: Box::new(MemoryStorage::new()),
        }
    }

    pub fn into_shared(self) -> SharedStore { Rc::new(RefCell::new(self)) }

    pub fn get(&self, key: &str) -> Option<&str> { self.values.get(key).map(String::as_str) }

    /// Entries in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        DEFINITIONS.iter().filter_map(|def| Some((def.key, self.get(def.key)?)))
    }

    pub fn update(&mut self, key: &str, value: &str) -> Result<()> {
        let def = definition(key).ok_or_else(|| PreferenceError::UnknownKey(key.to_owned()))?;
        def.validate(value)?;
        self.values.insert(def.key, value.to_owned());
        Ok(())
    }

    pub fn save(&self) -> Result<()> { self.storage.save(&self.raw()) }

    pub fn settings(&self) -> SwitcherSettings { SwitcherSettings::read(self) }

    /// Final flush when the application shuts down.
    pub fn close(self) -> Result<()> {
        self.save()?;
        info!("preferences flushed");
        Ok(())
    }

    fn raw(&self) -> RawPreferences {
        self.iter().map(|(key, value)| (key.to_owned(), value.to_owned())).collect()
    }
}

impl fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn load_fills_missing_and_invalid_values_with_defaults() {
        let storage = MemoryStorage::with_values([
            ("theme", "Windows 10"),
            ("tabKeyCode", "999"),
            ("somethingElse", "1"),
        ]);
        let store = PreferenceStore::load(storage).unwrap();

        assert_eq!(store.get("theme"), Some("Windows 10"));
        assert_eq!(store.get("tabKeyCode"), Some("48"));
        assert_eq!(store.get("maxScreenUsage"), Some("80"));
        assert_eq!(store.get("somethingElse"), None);
        assert_eq!(store.iter().count(), DEFINITIONS.len());
    }

    #[test]
    fn update_validates_before_storing() {
        let mut store = PreferenceStore::in_memory();

        let err = store.update("tabKeyCode", "999").unwrap_err();
        assert!(matches!(err, PreferenceError::InvalidValue { key: "tabKeyCode", .. }));
        assert_eq!(store.get("tabKeyCode"), Some("48"));

        store.update("tabKeyCode", "49").unwrap();
        assert_eq!(store.get("tabKeyCode"), Some("49"));

        assert!(matches!(store.update("nope", "1"), Err(PreferenceError::UnknownKey(_))));
    }

    #[test]
    fn save_writes_every_entry() {
        let storage = MemoryStorage::new();
        let mut store = PreferenceStore::load(storage.clone()).unwrap();
        store.update("iconSize", "48").unwrap();
        store.save().unwrap();

        let written = storage.values();
        assert_eq!(written.len(), DEFINITIONS.len());
        assert_eq!(written.get("iconSize").map(String::as_str), Some("48"));
    }

    #[test]
    fn close_flushes() {
        let storage = MemoryStorage::new();
        let mut store = PreferenceStore::load(storage.clone()).unwrap();
        store.update("minRows", "3").unwrap();
        store.close().unwrap();
        assert_eq!(storage.writes(), 1);
        assert_eq!(storage.values().get("minRows").map(String::as_str), Some("3"));
    }

    #[test]
    fn iteration_follows_definition_order() {
        let store = PreferenceStore::in_memory();
        let keys: Vec<_> = store.iter().map(|(key, _)| key).collect();
        let expected: Vec<_> = DEFINITIONS.iter().map(|def| def.key).collect();
        assert_eq!(keys, expected);
    }
}
