use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModSortError {
    #[error("Invalid mod input: {reason}")]
    InvalidInput { reason: String },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid classification rules: {0}")]
    InvalidRules(String),

    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("Unknown config key: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for config key '{key}': {message}")]
    InvalidConfigValue { key: String, message: String },

    #[error("Missing credential: environment variable {name} is not set")]
    MissingCredential { name: String },

    #[error("Notion database id is not configured (set notion.database_id or NOTION_DB_ID)")]
    MissingDatabaseId,

    #[error("Notion API error (HTTP {status}): {message}")]
    NotionApi { status: u16, message: String },

    #[error("Notion page not found: {id}")]
    PageNotFound { id: String },

    #[error("Extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ModSortError>;

impl ModSortError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput { .. } | Self::InvalidUrl { .. } => 2,
            Self::ConfigParse { .. }
            | Self::ConfigKeyNotFound { .. }
            | Self::InvalidConfigValue { .. }
            | Self::InvalidRules(_) => 3,
            Self::MissingCredential { .. } | Self::MissingDatabaseId => 4,
            Self::NotionApi { .. } | Self::PageNotFound { .. } => 5,
            Self::Extraction { .. } | Self::Http(_) => 6,
            _ => 1,
        }
    }

    /// Whether retrying the same Notion request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NotionApi { status, .. } => *status == 429 || *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
