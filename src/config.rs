use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::liveness::default_cutoff_date;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "DYNASTYGEN_CONFIG";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "dynastygen.toml";

/// Upper bound for `source.request_delay_secs`
pub const MAX_REQUEST_DELAY_SECS: f64 = 3600.0;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub source: SourceConfig,
    pub traversal: TraversalConfig,
    pub record: RecordConfig,
    pub game: GameConfig,
}

/// Knowledge source (SPARQL endpoint) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Pause before every outbound query, in seconds
    pub request_delay_secs: f64,
    pub timeout_secs: u64,
    /// Language of the label that drives identifiers and name tokens
    pub primary_language: String,
    /// Language of the label carried in the comment line
    pub secondary_language: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://query.wikidata.org/sparql".to_string(),
            user_agent: format!("dynastygen/{}", env!("CARGO_PKG_VERSION")),
            request_delay_secs: 0.2,
            timeout_secs: 60,
            primary_language: "en".to_string(),
            secondary_language: "ja".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_delay_secs.clamp(0.0, MAX_REQUEST_DELAY_SECS))
            .unwrap_or_default()
    }
}

/// Genealogy traversal configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    pub cutoff_date: NaiveDate,
    pub ancestor_depth: usize,
    pub descendant_depth: usize,
    pub ensure_fathers_depth: usize,
    pub include_root_if_not_alive: bool,
    pub descendants_require_birth: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            cutoff_date: default_cutoff_date(),
            ancestor_depth: 6,
            descendant_depth: 6,
            ensure_fathers_depth: 1,
            include_root_if_not_alive: false,
            descendants_require_birth: true,
        }
    }
}

/// Emitted character record configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    pub id_prefix: String,
    pub name_prefix: String,
    pub name_fallback_prefix: String,
    pub culture: String,
    pub religion: String,
    pub dynasty: Option<String>,
    pub tag: Option<String>,
    pub birth_location: Option<String>,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            id_prefix: "wd_".to_string(),
            name_prefix: "name_".to_string(),
            name_fallback_prefix: "name_q".to_string(),
            culture: "saigoku_culture".to_string(),
            religion: "shinto".to_string(),
            dynasty: None,
            tag: None,
            birth_location: None,
        }
    }
}

/// Game installation layout, used by the tree visualiser
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub base_game_dir: Option<PathBuf>,
    pub mod_dir: Option<PathBuf>,
    /// Character file path, relative to the mod or base game directory
    pub characters_file: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            base_game_dir: None,
            mod_dir: None,
            characters_file: PathBuf::from("main_menu/setup/start/05_characters.txt"),
        }
    }
}

impl GameConfig {
    /// Character file to read: the mod's copy if it exists, else the base game's.
    pub fn resolve_characters_file(&self) -> Option<PathBuf> {
        [self.mod_dir.as_ref(), self.base_game_dir.as_ref()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(&self.characters_file))
            .find(|path| path.is_file())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            source: SourceConfig::default(),
            traversal: TraversalConfig::default(),
            record: RecordConfig::default(),
            game: GameConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in DYNASTYGEN_CONFIG environment variable (must exist)
    /// 2. ./dynastygen.toml in current directory
    ///
    /// Falls back to built-in defaults when neither is present.
    pub fn load() -> Result<Self> {
        // Optional; a missing .env is not an error
        let _ = dotenv::dotenv();

        let config_path = match std::env::var(CONFIG_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    let config = Config::default();
                    config.validate()?;
                    return Ok(config);
                }
                path
            }
        };

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::from_toml(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.source.endpoint)
            .with_context(|| format!("source.endpoint is not a valid URL: {}", self.source.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("source.endpoint must use http or https, got {}", endpoint.scheme());
        }

        let delay = self.source.request_delay_secs;
        if !delay.is_finite() || !(0.0..=MAX_REQUEST_DELAY_SECS).contains(&delay) {
            anyhow::bail!(
                "source.request_delay_secs must be between 0 and {} seconds, got {}",
                MAX_REQUEST_DELAY_SECS,
                delay
            );
        }

        if self.source.timeout_secs == 0 {
            anyhow::bail!("source.timeout_secs must be greater than 0");
        }

        if self.source.primary_language.trim().is_empty()
            || self.source.secondary_language.trim().is_empty()
        {
            anyhow::bail!("source languages must not be empty");
        }

        if self.record.culture.trim().is_empty() || self.record.religion.trim().is_empty() {
            anyhow::bail!("record.culture and record.religion must not be empty");
        }

        Ok(())
    }
}
