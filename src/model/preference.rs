use strum::VariantNames;

use crate::model::error::{PreferenceError, Result};
use crate::model::settings::{MetaKey, ShowOnScreen, Theme};

/// What a preference's serialized value is allowed to look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKind {
    /// One of a fixed set of labels.
    Choice(&'static [&'static str]),
    /// An integer in `min..=max`.
    Integer { min: i64, max: i64 },
    /// `"true"` or `"false"`.
    Flag,
    /// A macOS virtual key code for a non-special key.
    KeyCode,
}

/// A preference entry: its key, the value it starts with, and the predicate
/// every stored value has to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceDefinition {
    pub key: &'static str,
    pub default: &'static str,
    pub kind: PreferenceKind,
}

pub const DEFINITIONS: &[PreferenceDefinition] = &[
    PreferenceDefinition {
        key: "metaKey",
        default: "⌥ option",
        kind: PreferenceKind::Choice(MetaKey::VARIANTS),
    },
    PreferenceDefinition {
        key: "tabKeyCode",
        default: "48",
        kind: PreferenceKind::KeyCode,
    },
    PreferenceDefinition {
        key: "theme",
        default: "macOS",
        kind: PreferenceKind::Choice(Theme::VARIANTS),
    },
    PreferenceDefinition {
        key: "maxScreenUsage",
        default: "80",
        kind: PreferenceKind::Integer { min: 10, max: 100 },
    },
    PreferenceDefinition {
        key: "minCellsPerRow",
        default: "4",
        kind: PreferenceKind::Integer { min: 1, max: 20 },
    },
    PreferenceDefinition {
        key: "maxCellsPerRow",
        default: "10",
        kind: PreferenceKind::Integer { min: 1, max: 40 },
    },
    PreferenceDefinition {
        key: "minRows",
        default: "1",
        kind: PreferenceKind::Integer { min: 1, max: 20 },
    },
    PreferenceDefinition {
        key: "iconSize",
        default: "32",
        kind: PreferenceKind::Integer { min: 0, max: 64 },
    },
    PreferenceDefinition {
        key: "fontHeight",
        default: "15",
        kind: PreferenceKind::Integer { min: 0, max: 64 },
    },
    PreferenceDefinition {
        key: "hideSpaceNumberLabels",
        default: "false",
        kind: PreferenceKind::Flag,
    },
    PreferenceDefinition {
        key: "windowDisplayDelay",
        default: "0",
        kind: PreferenceKind::Integer { min: 0, max: 2000 },
    },
    PreferenceDefinition {
        key: "showOnScreen",
        default: "Main screen",
        kind: PreferenceKind::Choice(ShowOnScreen::VARIANTS),
    },
];

pub fn definition(key: &str) -> Option<&'static PreferenceDefinition> {
    DEFINITIONS.iter().find(|def| def.key == key)
}

// non-special keys on both mac and pc keyboards
pub fn is_whitelisted_key_code(code: i64) -> bool {
    matches!(
        code,
        0..=53
            | 65
            | 67
            | 69
            | 75
            | 76
            | 78
            | 81..=89
            | 91
            | 92
            | 115
            | 116
            | 117
            | 119
            | 121
            | 123..=126
    )
}

impl PreferenceKind {
    fn check(&self, raw: &str) -> std::result::Result<(), String> {
        match *self {
            PreferenceKind::Choice(labels) => {
                if labels.contains(&raw) {
                    Ok(())
                } else {
                    Err(format!("expected one of: {}", labels.join(", ")))
                }
            }
            PreferenceKind::Integer { min, max } => match raw.parse::<i64>() {
                Ok(value) if (min..=max).contains(&value) => Ok(()),
                _ => Err(format!("expected an integer between {min} and {max}")),
            },
            PreferenceKind::Flag => match raw {
                "true" | "false" => Ok(()),
                _ => Err("expected true or false".into()),
            },
            PreferenceKind::KeyCode => match raw.parse::<i64>() {
                Ok(code) if is_whitelisted_key_code(code) => Ok(()),
                Ok(_) => Err("this key code is not supported".into()),
                Err(_) => Err("expected a numeric key code".into()),
            },
        }
    }
}

impl PreferenceDefinition {
    pub fn validate(&self, raw: &str) -> Result<()> {
        self.kind.check(raw).map_err(|reason| PreferenceError::InvalidValue {
            key: self.key,
            value: raw.to_owned(),
            reason,
        })
    }

    pub fn is_valid(&self, raw: &str) -> bool { self.kind.check(raw).is_ok() }
}
