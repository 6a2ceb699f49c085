use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModSortError, Result};

/// Mod metadata as scraped from a mod page
///
/// Only `name`, `description` and `creator` take part in classification;
/// `url` identifies the mod in the Notion database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub url: String,
}

impl ModRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        creator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            creator: creator.into(),
            url: String::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Record with nothing but the URL, used when extraction fails
    pub fn empty(url: impl Into<String>) -> Self {
        Self::default().with_url(url)
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Decode an untyped JSON item.
    ///
    /// Missing fields and `null` become empty strings; anything that is not
    /// an object, or a field that is not a string, is rejected.
    pub fn from_value(item: &Value) -> Result<Self> {
        let object = item.as_object().ok_or_else(|| ModSortError::InvalidInput {
            reason: format!("expected an object, got {}", json_kind(item)),
        })?;

        let field = |key: &str| -> Result<String> {
            match object.get(key) {
                None | Some(Value::Null) => Ok(String::new()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(ModSortError::InvalidInput {
                    reason: format!("field '{}' must be a string, got {}", key, json_kind(other)),
                }),
            }
        };

        Ok(Self {
            name: field("name")?,
            description: field("description")?,
            creator: field("creator")?,
            url: field("url")?,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
