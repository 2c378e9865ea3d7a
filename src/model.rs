pub mod error;
pub mod preference;
pub mod settings;
pub mod storage;
pub mod store;

pub use error::{CommitError, PreferenceError};
pub use preference::{DEFINITIONS, PreferenceDefinition, PreferenceKind};
pub use settings::SwitcherSettings;
pub use storage::{MemoryStorage, PreferenceStorage, RawPreferences, TomlFileStorage};
pub use store::{PreferenceStore, SharedStore};
