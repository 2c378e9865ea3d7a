use std::path::PathBuf;

/// Failures raised by the preference store and its storage backends.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("unknown preference '{0}'")]
    UnknownKey(String),

    #[error("'{value}' is not a valid value for '{key}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("preference '{key}' cannot be edited with a {control}")]
    RowMismatch {
        key: &'static str,
        control: &'static str,
    },

    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode preferences: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("could not decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T, E = PreferenceError> = std::result::Result<T, E>;

/// The single user-facing failure of a commit attempt. It always names the
/// preference so the recovery sheet can tell the user what to fix.
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("Please enter a valid value for '{key}'")]
    StillInvalid { key: &'static str },

    #[error("Could not save '{key}': {source}")]
    Rejected {
        key: &'static str,
        #[source]
        source: PreferenceError,
    },
}

impl CommitError {
    pub fn key(&self) -> &'static str {
        match self {
            CommitError::StillInvalid { key } | CommitError::Rejected { key, .. } => key,
        }
    }
}
