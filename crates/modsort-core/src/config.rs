use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classify::{RuleSet, RulesConfig};
use crate::error::{ModSortError, Result};
use crate::notion::PropertyNames;

const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding `notion.database_id`
pub const DATABASE_ID_ENV: &str = "NOTION_DB_ID";
pub const DEFAULT_API_KEY_ENV: &str = "NOTION_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# modsort configuration file
# Location: ~/.modsort/config.toml

[notion]
# Id of the mods database (the 32 hex digits in the database URL)
# The NOTION_DB_ID environment variable takes precedence
database_id = ""

# Environment variable holding the integration token
# The token itself is never stored in this file
api_key_env = "NOTION_API_KEY"

# Property names in the database
[notion.properties]
name = "Nome"
creator = "Criador"
url = "Link"
priority = "Prioridade"
folder = "Pasta"
notes = "Notes"

[extractor]
# Seconds before a mod page request is abandoned
timeout_secs = 10
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"

[rules]
# Replace the keywords of a tier: core, system, gameplay, cosmetic
# Tiers left out keep their builtin keywords
# Example: core = ["framework", "core", "library", "script extender"]

# Replace the sub-classification rules (first match wins)
# [[rules.subclass]]
# keyword = "inventory"
# code = "5B"
# label = "Utilitários de Inventário e Gestão"
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub notion: NotionConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub rules: RulesConfig,
}

/// Notion database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    #[serde(default)]
    pub database_id: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub properties: PropertyNames,
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            database_id: String::new(),
            api_key_env: default_api_key_env(),
            properties: PropertyNames::default(),
        }
    }
}

/// Mod page fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| ModSortError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self).map_err(|e| ModSortError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        if let Some(property) = key.strip_prefix("notion.properties.") {
            let names = &mut self.notion.properties;
            let slot = match property {
                "name" => &mut names.name,
                "creator" => &mut names.creator,
                "url" => &mut names.url,
                "priority" => &mut names.priority,
                "folder" => &mut names.folder,
                "notes" => &mut names.notes,
                _ => {
                    return Err(ModSortError::ConfigKeyNotFound {
                        key: key.to_string(),
                    })
                }
            };
            *slot = non_empty(key, value)?;
            return Ok(());
        }

        match key {
            "notion.database_id" => {
                self.notion.database_id = value.to_string();
                Ok(())
            }
            "notion.api_key_env" => {
                self.notion.api_key_env = non_empty(key, value)?;
                Ok(())
            }
            "extractor.timeout_secs" => {
                self.extractor.timeout_secs = parse_timeout(key, value)?;
                Ok(())
            }
            "extractor.user_agent" => {
                self.extractor.user_agent = non_empty(key, value)?;
                Ok(())
            }
            _ => Err(ModSortError::ConfigKeyNotFound {
                key: key.to_string(),
            }),
        }
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        let names = &self.notion.properties;
        vec![
            (
                "notion.database_id".to_string(),
                self.notion.database_id.clone(),
            ),
            (
                "notion.api_key_env".to_string(),
                self.notion.api_key_env.clone(),
            ),
            ("notion.properties.name".to_string(), names.name.clone()),
            ("notion.properties.creator".to_string(), names.creator.clone()),
            ("notion.properties.url".to_string(), names.url.clone()),
            (
                "notion.properties.priority".to_string(),
                names.priority.clone(),
            ),
            ("notion.properties.folder".to_string(), names.folder.clone()),
            ("notion.properties.notes".to_string(), names.notes.clone()),
            (
                "extractor.timeout_secs".to_string(),
                self.extractor.timeout_secs.to_string(),
            ),
            (
                "extractor.user_agent".to_string(),
                self.extractor.user_agent.clone(),
            ),
        ]
    }

    /// Database id, `NOTION_DB_ID` first.
    pub fn database_id(&self) -> Result<String> {
        self.resolve_database_id(std::env::var(DATABASE_ID_ENV).ok())
    }

    fn resolve_database_id(&self, from_env: Option<String>) -> Result<String> {
        from_env
            .filter(|id| !id.trim().is_empty())
            .or_else(|| Some(self.notion.database_id.clone()))
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ModSortError::MissingDatabaseId)
    }

    /// Builtin rules with the `[rules]` overrides applied
    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::builtin().with_config(&self.rules)
    }
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(ModSortError::InvalidConfigValue {
            key: key.to_string(),
            message: "value must not be empty".to_string(),
        });
    }
    Ok(value.to_string())
}

fn parse_timeout(key: &str, value: &str) -> Result<u64> {
    let invalid = |message: &str| ModSortError::InvalidConfigValue {
        key: key.to_string(),
        message: message.to_string(),
    };
    let secs: u64 = value
        .parse()
        .map_err(|_| invalid("expected a whole number of seconds"))?;
    if secs == 0 {
        return Err(invalid("timeout must be at least 1 second"));
    }
    Ok(secs)
}
