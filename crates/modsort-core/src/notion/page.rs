use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::notes::{plain_text, read_notes_lines};
use super::properties::PropertyNames;

/// A mod page as read back from the database
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModPage {
    pub page_id: String,
    pub name: String,
    pub creator: String,
    pub url: String,
    pub folder: String,
    pub priority: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ModPage {
    /// Read a Notion page object.
    ///
    /// Missing or differently typed properties become empty values; only the
    /// page id is required.
    pub fn from_page(page: &Value, names: &PropertyNames) -> Option<Self> {
        let page_id = page.get("id").and_then(Value::as_str)?.to_string();
        let empty = Value::Null;
        let props = page.get("properties").unwrap_or(&empty);
        let prop = |name: &str| props.get(name).unwrap_or(&empty);

        Some(Self {
            page_id,
            name: plain_text(prop(&names.name), "title"),
            creator: plain_text(prop(&names.creator), "rich_text"),
            url: prop(&names.url)
                .get("url")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            folder: select_name(prop(&names.folder)),
            priority: select_name(prop(&names.priority)),
            notes: read_notes_lines(prop(&names.notes)),
        })
    }
}

fn select_name(property: &Value) -> String {
    property
        .pointer("/select/name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
