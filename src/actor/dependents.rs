use tracing::{debug, warn};

use crate::actor::switcher;
use crate::model::store::SharedStore;

/// Components that have to reload after a preference was committed.
pub trait DependentComponents {
    fn reinitialize(&mut self);
}

impl<F: FnMut()> DependentComponents for F {
    fn reinitialize(&mut self) { self() }
}

/// Pushes a fresh settings snapshot to the switcher actor on every commit.
pub struct SettingsBroadcaster {
    store: SharedStore,
    tx: switcher::Sender,
}

impl SettingsBroadcaster {
    pub fn new(store: SharedStore, tx: switcher::Sender) -> Self { Self { store, tx } }
}

impl DependentComponents for SettingsBroadcaster {
    fn reinitialize(&mut self) {
        let Ok(store) = self.store.try_borrow() else {
            warn!("preference store busy, skipping reload");
            return;
        };
        let settings = store.settings();
        drop(store);
        debug!(?settings, "broadcasting settings");
        self.tx.send(switcher::Event::PreferencesUpdated(settings));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::actor;
    use crate::model::settings::Theme;
    use crate::model::store::PreferenceStore;

    #[test]
    fn closures_are_dependents() {
        let mut calls = 0;
        let mut reload = || calls += 1;
        reload.reinitialize();
        reload.reinitialize();
        assert_eq!(calls, 2);
    }

    #[test]
    fn broadcaster_sends_the_current_settings() {
        let store = PreferenceStore::in_memory().into_shared();
        let (tx, mut rx) = actor::channel();
        let mut broadcaster = SettingsBroadcaster::new(store.clone(), tx);

        store.borrow_mut().update("theme", "Windows 10").unwrap();
        broadcaster.reinitialize();

        let (_span, event) = rx.try_recv().unwrap();
        let settings = match event {
            switcher::Event::PreferencesUpdated(settings) => settings,
            other => panic!("unexpected event {other:?}"),
        };
        assert_eq!(settings.theme, Theme::Windows10);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn broadcaster_skips_while_the_store_is_borrowed() {
        let store = PreferenceStore::in_memory().into_shared();
        let (tx, mut rx) = actor::channel();
        let mut broadcaster = SettingsBroadcaster::new(store.clone(), tx);

        let _guard = store.borrow_mut();
        broadcaster.reinitialize();
        assert!(rx.try_recv().is_err());
    }
}
