use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::classify::{Classification, Priority};
use crate::record::ModRecord;

use super::notes::rich_text_chunks;

/// Names of the database properties, as they appear in Notion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyNames {
    /// Title property
    #[serde(default = "default_name")]
    pub name: String,
    /// Rich text property
    #[serde(default = "default_creator")]
    pub creator: String,
    /// URL property
    #[serde(default = "default_url")]
    pub url: String,
    /// Select property, options named `"0"` to `"5"`
    #[serde(default = "default_priority")]
    pub priority: String,
    /// Select property, options named after the folder labels
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Rich text property
    #[serde(default = "default_notes")]
    pub notes: String,
}

fn default_name() -> String {
    "Nome".to_string()
}

fn default_creator() -> String {
    "Criador".to_string()
}

fn default_url() -> String {
    "Link".to_string()
}

fn default_priority() -> String {
    "Prioridade".to_string()
}

fn default_folder() -> String {
    "Pasta".to_string()
}

fn default_notes() -> String {
    "Notes".to_string()
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            name: default_name(),
            creator: default_creator(),
            url: default_url(),
            priority: default_priority(),
            folder: default_folder(),
            notes: default_notes(),
        }
    }
}

/// Property values to write to a page
///
/// Empty values are left out of the request, so an update never blanks a
/// property by accident.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageProperties {
    pub name: Option<String>,
    pub creator: Option<String>,
    pub url: Option<String>,
    pub priority: Option<Priority>,
    pub folder: Option<String>,
    pub notes: Option<String>,
}

impl PageProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything needed to create a page for a classified mod.
    pub fn for_new_page(record: &ModRecord, classification: &Classification) -> Self {
        Self::new()
            .name(&record.name)
            .creator(&record.creator)
            .url(&record.url)
            .classification(classification)
            .notes(classification.notes_suffix.as_deref().unwrap_or_default())
    }

    /// Only the classification columns, for updating an existing page.
    pub fn for_update(classification: &Classification) -> Self {
        Self::new().classification(classification)
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = non_empty(name);
        self
    }

    pub fn creator(mut self, creator: &str) -> Self {
        self.creator = non_empty(creator);
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = non_empty(url);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.folder = non_empty(folder);
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = non_empty(notes);
        self
    }

    pub fn classification(self, classification: &Classification) -> Self {
        self.priority(classification.priority)
            .folder(&classification.folder)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Notion `properties` object.
    pub fn to_json(&self, names: &PropertyNames) -> Value {
        let mut props = Map::new();

        if let Some(name) = &self.name {
            props.insert(
                names.name.clone(),
                json!({ "title": rich_text_chunks(name) }),
            );
        }
        if let Some(creator) = &self.creator {
            props.insert(
                names.creator.clone(),
                json!({ "rich_text": rich_text_chunks(creator) }),
            );
        }
        if let Some(url) = &self.url {
            props.insert(names.url.clone(), json!({ "url": url }));
        }
        if let Some(priority) = self.priority {
            props.insert(
                names.priority.clone(),
                json!({ "select": { "name": priority.to_string() } }),
            );
        }
        if let Some(folder) = &self.folder {
            props.insert(
                names.folder.clone(),
                json!({ "select": { "name": folder } }),
            );
        }
        if let Some(notes) = &self.notes {
            props.insert(
                names.notes.clone(),
                json!({ "rich_text": rich_text_chunks(notes) }),
            );
        }

        Value::Object(props)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ModClassifier;
    use crate::notion::RICH_TEXT_LIMIT;

    #[test]
    fn test_empty_values_are_skipped() {
        let props = PageProperties::new().name("Mod").creator("").url("  ");
        let json = props.to_json(&PropertyNames::default());
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(json["Nome"]["title"][0]["text"]["content"], "Mod");
    }

    #[test]
    fn test_priority_is_stringified_select() {
        let props = PageProperties::new().priority(Priority::GAMEPLAY);
        let json = props.to_json(&PropertyNames::default());
        assert_eq!(json["Prioridade"]["select"]["name"], "3");
    }

    #[test]
    fn test_new_page_properties_from_classification() {
        let record = ModRecord::new("Inventory Framework", "", "Creator").with_url("https://x.com/m");
        let classification = ModClassifier::builtin().classify_record(&record);
        let json = PageProperties::for_new_page(&record, &classification)
            .to_json(&PropertyNames::default());

        assert_eq!(json["Link"]["url"], "https://x.com/m");
        assert_eq!(json["Criador"]["rich_text"][0]["text"]["content"], "Creator");
        assert_eq!(json["Prioridade"]["select"]["name"], "1");
        assert_eq!(json["Pasta"]["select"]["name"], "01 - Core");
        assert_eq!(
            json["Notes"]["rich_text"][0]["text"]["content"],
            "5B — Utilitários de Inventário e Gestão"
        );
    }

    #[test]
    fn test_update_only_touches_classification_columns() {
        let classification = ModClassifier::builtin().classify("career", "", "");
        let json = PageProperties::for_update(&classification).to_json(&PropertyNames::default());
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(json.get("Nome").is_none());
        assert_eq!(json["Pasta"]["select"]["name"], "02 - Sistemas");
    }

    #[test]
    fn test_long_title_and_creator_are_chunked() {
        let long = "x".repeat(RICH_TEXT_LIMIT * 2 + 1);
        let json = PageProperties::new()
            .name(&long)
            .creator(&long)
            .to_json(&PropertyNames::default());

        for (key, kind) in [("Nome", "title"), ("Criador", "rich_text")] {
            let fragments = json[key][kind].as_array().unwrap();
            assert_eq!(fragments.len(), 3);
            assert!(fragments
                .iter()
                .all(|f| f["text"]["content"].as_str().unwrap().chars().count() <= RICH_TEXT_LIMIT));
        }
    }

    #[test]
    fn test_custom_property_names() {
        let names: PropertyNames = toml::from_str(r#"name = "Title""#).unwrap();
        assert_eq!(names.name, "Title");
        assert_eq!(names.folder, "Pasta");

        let json = PageProperties::new().name("X").to_json(&names);
        assert!(json.get("Title").is_some());
    }
}
