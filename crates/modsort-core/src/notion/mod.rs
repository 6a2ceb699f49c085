//! # Notion Module
//!
//! Reads and writes the mods database.
//!
//! ## Database layout
//!
//! | Property     | Type      | Written on          |
//! |--------------|-----------|---------------------|
//! | `Nome`       | title     | create              |
//! | `Criador`    | rich text | create              |
//! | `Link`       | url       | create              |
//! | `Prioridade` | select    | create, update      |
//! | `Pasta`      | select    | create, update      |
//! | `Notes`      | rich text | create, append only |
//!
//! Property names can be overridden under `[notion.properties]` in the config.
//!
//! ## Module layout
//!
//! - `client`: HTTP transport with retries
//! - `properties`: property names and request payloads
//! - `notes`: rich text helpers for the append-only Notes column
//! - `page`: page objects read back from Notion
//! - `store`: search, create, update and sync

mod client;
mod notes;
mod page;
mod properties;
mod store;

pub use client::{NotionClient, NotionTransport, RetryPolicy, NOTION_API_URL, NOTION_VERSION};
pub use notes::{merge_notes, plain_text, read_notes_lines, rich_text_chunks, RICH_TEXT_LIMIT};
pub use page::ModPage;
pub use properties::{PageProperties, PropertyNames};
pub use store::{
    ImportOutcome, NotionStore, SyncAction, SyncMode, SyncReport, DEFAULT_SEARCH_LIMIT,
};
