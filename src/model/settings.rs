use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use strum::{Display, EnumString, VariantNames};

use crate::model::store::PreferenceStore;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantNames,
)]
pub enum MetaKey {
    #[default]
    #[strum(to_string = "⌥ option")]
    Alt,
    #[strum(to_string = "⌃ control")]
    Control,
    #[strum(to_string = "⌘ command")]
    Command,
    #[strum(to_string = "⇪ caps lock")]
    CapsLock,
    #[strum(to_string = "fn")]
    Function,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantNames,
)]
pub enum Theme {
    #[default]
    #[strum(to_string = "macOS")]
    MacOs,
    #[strum(to_string = "Windows 10")]
    Windows10,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, VariantNames,
)]
pub enum ShowOnScreen {
    #[default]
    #[strum(to_string = "Main screen")]
    Main,
    #[strum(to_string = "Screen including mouse")]
    IncludingMouse,
}

/// Typed view of the preference store, handed to the components that have to
/// reload whenever a preference is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitcherSettings {
    pub meta_key: MetaKey,
    pub tab_key_code: u16,
    pub theme: Theme,
    /// Fraction of the screen the switcher may cover, in `0.1..=1.0`.
    pub max_screen_usage: f64,
    pub min_cells_per_row: u32,
    pub max_cells_per_row: u32,
    pub min_rows: u32,
    pub icon_size: u32,
    pub font_height: u32,
    pub hide_space_number_labels: bool,
    pub window_display_delay: Duration,
    pub show_on_screen: ShowOnScreen,
}

impl SwitcherSettings {
    pub fn read(store: &PreferenceStore) -> Self {
        let percent: u32 = parsed(store, "maxScreenUsage");
        let delay_ms: u64 = parsed(store, "windowDisplayDelay");
        Self {
            meta_key: parsed(store, "metaKey"),
            tab_key_code: parsed(store, "tabKeyCode"),
            theme: parsed(store, "theme"),
            max_screen_usage: f64::from(percent) / 100.0,
            min_cells_per_row: parsed(store, "minCellsPerRow"),
            max_cells_per_row: parsed(store, "maxCellsPerRow"),
            min_rows: parsed(store, "minRows"),
            icon_size: parsed(store, "iconSize"),
            font_height: parsed(store, "fontHeight"),
            hide_space_number_labels: parsed(store, "hideSpaceNumberLabels"),
            window_display_delay: Duration::from_millis(delay_ms),
            show_on_screen: parsed(store, "showOnScreen"),
        }
    }

    /// Columns a row of thumbnails may use. A minimum above the maximum wins.
    pub fn cells_per_row(&self) -> RangeInclusive<u32> {
        let min = self.min_cells_per_row.max(1);
        min..=self.max_cells_per_row.max(min)
    }
}

impl Default for SwitcherSettings {
    fn default() -> Self { Self::read(&PreferenceStore::in_memory()) }
}

// values in the store already passed validation
fn parsed<T: FromStr + Default>(store: &PreferenceStore, key: &str) -> T {
    store.get(key).and_then(|raw| raw.parse().ok()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn label_enums_round_trip_through_their_labels() {
        assert_eq!(MetaKey::VARIANTS, &["⌥ option", "⌃ control", "⌘ command", "⇪ caps lock", "fn"]);
        assert_eq!("⌘ command".parse::<MetaKey>().unwrap(), MetaKey::Command);
        assert_eq!(Theme::Windows10.to_string(), "Windows 10");
        assert_eq!(
            "Screen including mouse".parse::<ShowOnScreen>().unwrap(),
            ShowOnScreen::IncludingMouse
        );
    }

    #[test]
    fn defaults_are_read_from_definitions() {
        let settings = SwitcherSettings::default();
        assert_eq!(settings.meta_key, MetaKey::Alt);
        assert_eq!(settings.tab_key_code, 48);
        assert_eq!(settings.theme, Theme::MacOs);
        assert_eq!(settings.max_screen_usage, 0.8);
        assert_eq!(settings.window_display_delay, Duration::ZERO);
        assert!(!settings.hide_space_number_labels);
    }

    #[test]
    fn reads_updated_values() {
        let mut store = PreferenceStore::in_memory();
        store.update("theme", "Windows 10").unwrap();
        store.update("windowDisplayDelay", "250").unwrap();
        store.update("hideSpaceNumberLabels", "true").unwrap();

        let settings = SwitcherSettings::read(&store);
        assert_eq!(settings.theme, Theme::Windows10);
        assert_eq!(settings.window_display_delay, Duration::from_millis(250));
        assert!(settings.hide_space_number_labels);
    }

    #[test]
    fn cells_per_row_never_inverts() {
        let mut store = PreferenceStore::in_memory();
        store.update("minCellsPerRow", "12").unwrap();
        store.update("maxCellsPerRow", "5").unwrap();
        assert_eq!(SwitcherSettings::read(&store).cells_per_row(), 12..=12);
    }
}
