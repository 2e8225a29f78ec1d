/// High-score persistence behind a small append/query trait.
///
/// Three backends ship with the game: an in-memory list, a JSON file next to
/// the player's home directory, and a Supabase (PostgREST) table over HTTP.
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::entities::HighscoreEntry;

/// How many rows the game-over screen lists.
pub const DEFAULT_TOP_N: usize = 7;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(reqwest::Error),
    Status { code: u16, body: String },
    Poisoned,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "score file i/o failed: {e}"),
            Self::Json(e) => write!(f, "score data is not valid json: {e}"),
            Self::Http(e) => write!(f, "score service request failed: {e}"),
            Self::Status { code, body } => {
                write!(f, "score service answered {code}: {body}")
            }
            Self::Poisoned => write!(f, "score store lock poisoned"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Http(e) => Some(e),
            Self::Status { .. } | Self::Poisoned => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ── Trait ────────────────────────────────────────────────────────────────────

pub trait ScoreStore: Send + Sync {
    fn insert(&self, entry: &HighscoreEntry) -> Result<(), StoreError>;

    /// Best `limit` entries, highest score first.
    fn query_top(&self, limit: usize) -> Result<Vec<HighscoreEntry>, StoreError>;
}

/// Record `entry`, then fetch the leaderboard to show.
pub fn save_and_fetch(
    store: &dyn ScoreStore,
    entry: &HighscoreEntry,
    limit: usize,
) -> Result<Vec<HighscoreEntry>, StoreError> {
    store.insert(entry)?;
    store.query_top(limit)
}

/// Stable sort by score, descending; ties keep insertion order.
fn top_n(entries: &[HighscoreEntry], limit: usize) -> Vec<HighscoreEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score));
    sorted.truncate(limit);
    sorted
}

// ── In-memory ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<HighscoreEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoreStore for MemoryStore {
    fn insert(&self, entry: &HighscoreEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.push(entry.clone());
        Ok(())
    }

    fn query_top(&self, limit: usize) -> Result<Vec<HighscoreEntry>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(top_n(&entries, limit))
    }
}

// ── JSON file ────────────────────────────────────────────────────────────────

/// All entries as one JSON array. A missing file reads as an empty board.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<HighscoreEntry>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Vec::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl ScoreStore for FileStore {
    fn insert(&self, entry: &HighscoreEntry) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load()?;
        entries.push(entry.clone());
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }

    fn query_top(&self, limit: usize) -> Result<Vec<HighscoreEntry>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(top_n(&self.load()?, limit))
    }
}

// ── Supabase / PostgREST ─────────────────────────────────────────────────────

pub struct SupabaseStore {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(
        base_url: &str,
        api_key: &str,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("wave-shooter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(StoreError::Status {
            code: status.as_u16(),
            body,
        })
    }
}

impl ScoreStore for SupabaseStore {
    fn insert(&self, entry: &HighscoreEntry) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&[entry])
            .send()?;
        Self::check(response)?;
        Ok(())
    }

    fn query_top(&self, limit: usize) -> Result<Vec<HighscoreEntry>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .client
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "nickname,score,stage"),
                ("order", "score.desc"),
                ("limit", limit.as_str()),
            ])
            .send()?;
        Ok(Self::check(response)?.json()?)
    }
}
