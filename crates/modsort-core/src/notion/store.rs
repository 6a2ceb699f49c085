//! Mod database store
//!
//! Lookup and write operations on the mods database, on top of any
//! [`NotionTransport`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::classify::{Classification, ModClassifier};
use crate::error::{ModSortError, Result};
use crate::extract::Extractor;
use crate::link::{is_url, match_key, normalize_url_lossy, notion_page_id, same_mod_url};
use crate::record::ModRecord;

use super::client::NotionTransport;
use super::notes::{merge_notes, rich_text_chunks};
use super::page::ModPage;
use super::properties::{PageProperties, PropertyNames};

/// Default number of fuzzy search results
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Pages checked after a substring URL match
const URL_CANDIDATES: usize = 20;

/// What `sync` does when the mod already has a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Leave existing pages untouched
    #[default]
    CreateOnly,
    /// Update priority and folder, append the sub-classification to Notes
    Upsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    Skipped,
}

/// Outcome of syncing one mod
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub action: SyncAction,
    pub page_id: String,
    /// Whether a line was added to Notes
    pub notes_appended: bool,
    pub synced_at: DateTime<Utc>,
}

impl SyncReport {
    fn new(action: SyncAction, page_id: String, notes_appended: bool) -> Self {
        Self {
            action,
            page_id,
            notes_appended,
            synced_at: Utc::now(),
        }
    }
}

/// Outcome of importing one URL
#[derive(Debug)]
pub struct ImportOutcome {
    pub url: String,
    /// Present once the page was extracted and classified
    pub classification: Option<Classification>,
    pub result: Result<SyncReport>,
}

impl ImportOutcome {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Mods database
pub struct NotionStore<T: NotionTransport> {
    transport: T,
    database_id: String,
    names: PropertyNames,
}

impl<T: NotionTransport> NotionStore<T> {
    pub fn new(transport: T, database_id: impl Into<String>, names: PropertyNames) -> Self {
        Self {
            transport,
            database_id: database_id.into(),
            names,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn property_names(&self) -> &PropertyNames {
        &self.names
    }

    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------

    /// Page id of the mod with this URL.
    ///
    /// Tries an exact match on the raw and normalized URL first, then a
    /// substring match on host and path. Substring hits only count when the
    /// stored link normalizes to the same page, so `/d/123` never matches
    /// `/d/1234`.
    pub fn search_by_url(&self, mod_url: &str) -> Result<Option<String>> {
        let normalized = normalize_url_lossy(mod_url);
        let exact = json!({
            "or": [
                { "property": self.names.url, "url": { "equals": mod_url.trim() } },
                { "property": self.names.url, "url": { "equals": normalized } }
            ]
        });
        if let Some(id) = self.first_page_id(exact)? {
            log::debug!("exact URL match for {}: {}", mod_url, id);
            return Ok(Some(id));
        }

        let key = match_key(&normalized);
        if key.is_empty() {
            return Ok(None);
        }
        let contains = json!({ "property": self.names.url, "url": { "contains": key } });
        let found = self
            .query(contains, URL_CANDIDATES)?
            .iter()
            .filter_map(|page| ModPage::from_page(page, &self.names))
            .find(|page| same_mod_url(&page.url, &normalized))
            .map(|page| page.page_id);
        match &found {
            Some(id) => log::debug!("partial URL match for {}: {}", mod_url, id),
            None => log::debug!("no page links to {}", normalized),
        }
        Ok(found)
    }

    /// Page id of the mod with exactly this name (and creator, when given).
    pub fn search_by_name_and_creator(
        &self,
        name: &str,
        creator: Option<&str>,
    ) -> Result<Option<String>> {
        let by_name = json!({ "property": self.names.name, "title": { "equals": name } });
        let filter = match creator.filter(|c| !c.trim().is_empty()) {
            Some(creator) => json!({
                "and": [
                    by_name,
                    { "property": self.names.creator, "rich_text": { "equals": creator } }
                ]
            }),
            None => by_name,
        };
        self.first_page_id(filter)
    }

    /// Pages whose name contains `query`.
    pub fn fuzzy_search(&self, query: &str, limit: usize) -> Result<Vec<ModPage>> {
        let filter = json!({ "property": self.names.name, "title": { "contains": query.trim() } });
        let pages = self.query(filter, limit)?;
        Ok(pages
            .iter()
            .filter_map(|page| {
                let parsed = ModPage::from_page(page, &self.names);
                if parsed.is_none() {
                    log::warn!("skipping search result without an id");
                }
                parsed
            })
            .collect())
    }

    /// Search by Notion page link, mod URL or name.
    ///
    /// A URL that is not in the database falls through to a name search.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<ModPage>> {
        let query = query.trim();
        if is_url(query) {
            if let Some(page_id) = notion_page_id(query) {
                return Ok(vec![self.get_page(&page_id)?]);
            }
            if let Some(page_id) = self.search_by_url(query)? {
                return Ok(vec![self.get_page(&page_id)?]);
            }
            log::info!("no page for {}, falling back to name search", query);
        }
        self.fuzzy_search(query, limit)
    }

    pub fn get_page(&self, page_id: &str) -> Result<ModPage> {
        let page = self.transport.retrieve_page(page_id)?;
        ModPage::from_page(&page, &self.names).ok_or_else(|| ModSortError::PageNotFound {
            id: page_id.to_string(),
        })
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Create a page in the database, returns its id.
    pub fn create_page(&self, properties: &PageProperties) -> Result<String> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": properties.to_json(&self.names)
        });
        let page = self.transport.create_page(&body)?;
        let id = page_id_of(&page)?;
        log::info!("created Notion page {}", id);
        Ok(id)
    }

    pub fn update_page(&self, page_id: &str, properties: &PageProperties) -> Result<()> {
        if properties.is_empty() {
            return Ok(());
        }
        let body = json!({ "properties": properties.to_json(&self.names) });
        self.transport.update_page(page_id, &body)?;
        log::info!("updated Notion page {}", page_id);
        Ok(())
    }

    /// Append a line to Notes, keeping existing content.
    ///
    /// Returns `false` when the line was already present.
    pub fn append_to_notes(&self, page_id: &str, line: &str) -> Result<bool> {
        let page = self.get_page(page_id)?;
        let Some(merged) = merge_notes(&page.notes, line) else {
            log::info!("line already in Notes of {}, skipping", page_id);
            return Ok(false);
        };

        let mut properties = Map::new();
        properties.insert(
            self.names.notes.clone(),
            json!({ "rich_text": rich_text_chunks(&merged) }),
        );
        let body = json!({ "properties": properties });
        self.transport.update_page(page_id, &body)?;
        log::info!("appended to Notes of {}", page_id);
        Ok(true)
    }

    /// Write a classified mod to the database.
    pub fn sync(
        &self,
        record: &ModRecord,
        classification: &Classification,
        mode: SyncMode,
    ) -> Result<SyncReport> {
        let existing = if record.url.trim().is_empty() {
            self.search_by_name_and_creator(&record.name, Some(record.creator.as_str()))?
        } else {
            self.search_by_url(&record.url)?
        };

        match (existing, mode) {
            (Some(page_id), SyncMode::CreateOnly) => {
                log::info!("'{}' already exists as {}", record.name, page_id);
                Ok(SyncReport::new(SyncAction::Skipped, page_id, false))
            }
            (Some(page_id), SyncMode::Upsert) => {
                self.update_page(&page_id, &PageProperties::for_update(classification))?;
                let appended = match &classification.notes_suffix {
                    Some(line) => self.append_to_notes(&page_id, line)?,
                    None => false,
                };
                Ok(SyncReport::new(SyncAction::Updated, page_id, appended))
            }
            (None, _) => {
                let properties = PageProperties::for_new_page(record, classification);
                let page_id = self.create_page(&properties)?;
                let appended = properties.notes.is_some();
                Ok(SyncReport::new(SyncAction::Created, page_id, appended))
            }
        }
    }

    /// Extract, classify and sync every URL, in order.
    ///
    /// A URL that fails at any step is reported in its outcome; the rest
    /// are still imported.
    pub fn import_urls<E: Extractor>(
        &self,
        extractor: &E,
        classifier: &ModClassifier,
        urls: &[String],
        mode: SyncMode,
    ) -> Vec<ImportOutcome> {
        let outcomes: Vec<ImportOutcome> = urls
            .iter()
            .map(|url| {
                let record = match extractor.extract_for_import(url) {
                    Ok(record) => record,
                    Err(e) => {
                        log::warn!("skipping {}: {}", url, e);
                        return ImportOutcome {
                            url: url.trim().to_string(),
                            classification: None,
                            result: Err(e),
                        };
                    }
                };
                let classification = classifier.classify_record(&record);
                let result = self.sync(&record, &classification, mode);
                if let Err(e) = &result {
                    log::warn!("sync failed for {}: {}", url, e);
                }
                ImportOutcome {
                    url: record.url,
                    classification: Some(classification),
                    result,
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        log::info!("imported {} URLs ({} failed)", outcomes.len(), failed);
        outcomes
    }

    fn query(&self, filter: Value, page_size: usize) -> Result<Vec<Value>> {
        let body = json!({ "filter": filter, "page_size": page_size.clamp(1, 100) });
        let response = self.transport.query_database(&self.database_id, &body)?;
        Ok(response
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn first_page_id(&self, filter: Value) -> Result<Option<String>> {
        Ok(self
            .query(filter, 1)?
            .first()
            .and_then(|page| page.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

fn page_id_of(page: &Value) -> Result<String> {
    page.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ModSortError::NotionApi {
            status: 200,
            message: "response has no page id".to_string(),
        })
}
