pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod link;
pub mod notion;
pub mod record;

pub use config::{Config, ExtractorConfig, NotionConfig};
pub use error::{ModSortError, Result};
pub use extract::{parse_html, Extractor, HttpExtractor};
pub use link::{normalize_url, notion_page_id, same_mod_url};
pub use record::ModRecord;

// Classification
pub use classify::{
    Classification, KeywordTier, ModClassifier, Priority, RuleSet, RulesConfig, ScoreBreakdown,
    SubclassRule, FOLDER_LABELS,
};

// Notion
pub use notion::{
    ImportOutcome, ModPage, NotionClient, NotionStore, NotionTransport, PageProperties,
    PropertyNames, RetryPolicy, SyncAction, SyncMode, SyncReport,
};
