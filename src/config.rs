use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "wave_shooter.toml";

pub const ENV_SUPABASE_URL: &str = "WAVE_SHOOTER_SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "WAVE_SHOOTER_SUPABASE_KEY";

/// Top-level configuration, loaded from `wave_shooter.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub gameplay: GameplayConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

/// Logical play-field size and frame pacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: f32,
    pub height: f32,
    pub frame_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            frame_ms: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Minimum time between shots. 0 = unlimited.
    pub fire_cooldown_ms: u64,
    /// Floor for formation spacing, as a share of the play-field width.
    pub min_spacing_ratio: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            fire_cooldown_ms: 0,
            min_spacing_ratio: 0.02,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
    Supabase,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// File backend location.
    pub path: PathBuf,
    pub url: String,
    pub api_key: String,
    pub table: String,
    pub timeout_secs: u64,
    pub top_n: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: default_score_path(),
            url: String::new(),
            api_key: String::new(),
            table: "highscores".to_string(),
            timeout_secs: 5,
            top_n: crate::store::DEFAULT_TOP_N,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("wave_shooter.log"),
            filter: "info".to_string(),
        }
    }
}

fn default_score_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".wave_shooter_scores.json")
}

// ── Loading ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

impl Config {
    /// Load `path`, or `wave_shooter.toml` if present, or defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not. Supabase credentials in the environment override the file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_SUPABASE_URL) {
            self.store.url = url;
        }
        if let Ok(key) = std::env::var(ENV_SUPABASE_KEY) {
            self.store.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.width <= 0.0 || self.display.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "play field must be positive, got {}x{}",
                self.display.width, self.display.height
            )));
        }
        let ratio = self.gameplay.min_spacing_ratio;
        if ratio <= 0.0 || ratio >= 0.1 {
            return Err(ConfigError::Invalid(format!(
                "min_spacing_ratio must be in (0, 0.1), got {}",
                self.gameplay.min_spacing_ratio
            )));
        }
        if self.store.backend == StoreBackend::Supabase
            && (self.store.url.is_empty() || self.store.api_key.is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "supabase backend needs store.url and store.api_key (or {ENV_SUPABASE_URL} / {ENV_SUPABASE_KEY})"
            )));
        }
        Ok(())
    }
}
