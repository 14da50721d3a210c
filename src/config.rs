//! Runtime configuration. Everything has a sensible default so a fresh install
//! runs without a config file; the TOML file only needs the keys a user wants
//! to override.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use serde::Deserialize;

use crate::models::{MAX_RELEASE_YEAR, MIN_RELEASE_YEAR};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".streaminsight";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "streaminsight.sqlite";
const LOG_FILE_NAME: &str = "streaminsight.log";
/// Overrides `database_path` when set.
pub const DB_ENV_VAR: &str = "STREAMINSIGHT_DB";

pub const DEFAULT_MIN_YEAR: i64 = 2010;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    /// Initial threshold for the "movies released since" table.
    pub default_min_year: i64,
    /// Insert the demo catalogue when the database has no users yet.
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = data_dir().unwrap_or_else(|_| PathBuf::from(DATA_DIR_NAME));
        Self {
            database_path: data_dir.join(DB_FILE_NAME),
            log_path: data_dir.join(LOG_FILE_NAME),
            default_min_year: DEFAULT_MIN_YEAR,
            seed_sample_data: false,
        }
    }
}

impl Config {
    /// Load `~/.streaminsight/config.toml`, falling back to defaults when the
    /// file does not exist, then apply the environment override.
    pub fn load_default() -> Result<Self> {
        let path = data_dir()?.join(CONFIG_FILE_NAME);
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };

        if let Some(db_path) = env::var_os(DB_ENV_VAR) {
            config.database_path = PathBuf::from(db_path);
        }

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let mut parsed: Self = toml::from_str(contents)?;
        parsed.default_min_year = parsed
            .default_min_year
            .clamp(MIN_RELEASE_YEAR, MAX_RELEASE_YEAR);
        Ok(parsed)
    }
}

/// Resolve `~/.streaminsight`.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
