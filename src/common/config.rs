use std::path::PathBuf;

use clap::Parser;

use crate::ui::form::FormMetrics;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("expected KEY=VALUE, got '{0}'")]
    MalformedAssignment(String),
    #[error("no config directory on this system; pass --prefs-file")]
    NoConfigDir,
}

/// Preferences window for the window switcher.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Preference file to load and save.
    #[arg(long, value_name = "PATH")]
    pub prefs_file: Option<PathBuf>,

    /// Build the form without a window and print it.
    #[arg(long)]
    pub headless: bool,

    /// Edit a preference through the form, e.g. `--set iconSize=48`.
    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_assignment,
        requires = "headless"
    )]
    pub edits: Vec<(String, String)>,

    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.trim().to_owned(), value.to_owned())),
        _ => Err(ConfigError::MalformedAssignment(raw.to_owned())),
    }
}

pub fn default_preferences_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join("switcher-prefs").join("preferences.toml"))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub preferences_path: PathBuf,
    pub metrics: FormMetrics,
    pub headless: bool,
    pub edits: Vec<(String, String)>,
    pub verbose: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let preferences_path = match cli.prefs_file {
            Some(path) => path,
            None => default_preferences_path()?,
        };
        Ok(Self {
            preferences_path,
            metrics: FormMetrics::default(),
            headless: cli.headless,
            edits: cli.edits,
            verbose: cli.verbose,
        })
    }
}
