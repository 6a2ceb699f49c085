//! Mod page extraction
//!
//! Best-effort scraping of a mod page into a [`ModRecord`]. Parsing is a set
//! of small regex and string-slicing passes over the raw HTML; a field that
//! cannot be found is left empty.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::blocking::Client;

use crate::config::ExtractorConfig;
use crate::error::{ModSortError, Result};
use crate::link::normalize_url;
use crate::record::ModRecord;

/// Maximum characters kept from paragraph text used as description
pub const DESCRIPTION_LIMIT: usize = 500;

/// Paragraphs joined when the page has no meta description
const DESCRIPTION_PARAGRAPHS: usize = 3;

static NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>")
        .expect("valid noise regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").expect("valid entity regex")
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute regex")
});
static META: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<meta\b[^>]*>").expect("valid meta regex"));
static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("valid paragraph regex"));
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<(h1)\b[^>]*>").expect("valid h1 regex"));
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(title)\b[^>]*>").expect("valid title regex"));
static TITLE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<([a-z][a-z0-9]*)\b[^>]*\bclass\s*=\s*["'][^"']*(?:title|heading)[^"']*["'][^>]*>"#)
        .expect("valid title class regex")
});
static AUTHOR_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<([a-z][a-z0-9]*)\b[^>]*\bclass\s*=\s*["'][^"']*(?:author|creator)[^"']*["'][^>]*>"#)
        .expect("valid author class regex")
});
static AUTHOR_REL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<(a)\b[^>]*\brel\s*=\s*["']?author\b[^>]*>"#).expect("valid rel regex")
});
static BY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^by\s+").expect("valid by regex"));
static BY_ANYWHERE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bby\s+").expect("valid by regex"));

/// Source of mod metadata
pub trait Extractor {
    /// Fetch and parse one mod page.
    fn extract(&self, url: &str) -> Result<ModRecord>;

    /// Like [`Extractor::extract`], but failures become an empty record
    /// carrying the URL.
    fn extract_or_empty(&self, url: &str) -> ModRecord {
        match self.extract(url) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("extraction failed for {}: {}", url, e);
                ModRecord::empty(url.trim())
            }
        }
    }

    /// Extract a mod that is about to be written to the database.
    ///
    /// The page is fetched as given; the record carries the normalized URL.
    /// A page without a mod name is an error.
    fn extract_for_import(&self, url: &str) -> Result<ModRecord> {
        let normalized = normalize_url(url)?;
        let mut record = self.extract(url.trim())?;
        if !record.has_name() {
            return Err(ModSortError::Extraction {
                url: url.trim().to_string(),
                message: "no mod name found on the page".to_string(),
            });
        }
        record.url = normalized;
        Ok(record)
    }

    /// Extract every URL, in order.
    fn extract_batch(&self, urls: &[String]) -> Vec<ModRecord> {
        let records: Vec<ModRecord> = urls.iter().map(|url| self.extract_or_empty(url)).collect();
        log::info!("extracted {} mod pages", records.len());
        records
    }
}

/// Extractor fetching pages over HTTP
pub struct HttpExtractor {
    http: Client,
}

impl HttpExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { http })
    }
}

impl Extractor for HttpExtractor {
    fn extract(&self, url: &str) -> Result<ModRecord> {
        let url = url.trim();
        let failed = |message: String| ModSortError::Extraction {
            url: url.to_string(),
            message,
        };

        log::debug!("fetching {}", url);
        let response = self.http.get(url).send().map_err(|e| failed(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status.as_u16())));
        }
        let html = response.text().map_err(|e| failed(e.to_string()))?;

        let record = parse_html(url, &html);
        log::info!("extracted '{}' from {}", record.name, url);
        Ok(record)
    }
}

/// Parse a mod page.
pub fn parse_html(url: &str, html: &str) -> ModRecord {
    let html = NOISE.replace_all(html, " ");
    ModRecord {
        name: extract_name(&html),
        description: extract_description(&html),
        creator: extract_creator(&html),
        url: url.trim().to_string(),
    }
}

fn extract_name(html: &str) -> String {
    [&*H1, &*TITLE, &*TITLE_CLASS]
        .into_iter()
        .filter_map(|open| element_text(html, open))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn extract_description(html: &str) -> String {
    let metas: Vec<Vec<(String, String)>> = META
        .find_iter(html)
        .map(|m| attributes(m.as_str()))
        .collect();
    let meta_content = |key: &str, value: &str| {
        metas.iter().find_map(|attrs| {
            let matches = attrs
                .iter()
                .any(|(k, v)| k == key && v.eq_ignore_ascii_case(value));
            if !matches {
                return None;
            }
            attrs
                .iter()
                .find(|(k, _)| k == "content")
                .map(|(_, v)| text_content(v))
                .filter(|v| !v.is_empty())
        })
    };
    if let Some(content) =
        meta_content("name", "description").or_else(|| meta_content("property", "og:description"))
    {
        return content;
    }

    let joined = PARAGRAPH
        .captures_iter(html)
        .take(DESCRIPTION_PARAGRAPHS)
        .map(|c| text_content(&c[1]))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    joined
        .chars()
        .take(DESCRIPTION_LIMIT)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn extract_creator(html: &str) -> String {
    let from_element = [&*AUTHOR_CLASS, &*AUTHOR_REL]
        .into_iter()
        .filter_map(|open| element_text(html, open))
        .map(|text| BY_PREFIX.replace(&text, "").trim().to_string())
        .find(|text| !text.is_empty());
    if let Some(creator) = from_element {
        return creator;
    }

    text_nodes(html)
        .filter_map(|text| {
            let by = BY_ANYWHERE.find(&text)?;
            let name = text[by.end()..].trim().to_string();
            (!name.is_empty()).then_some(name)
        })
        .next()
        .unwrap_or_default()
}

/// Text of the first element whose opening tag matches `open`.
///
/// `open` must capture the tag name in group 1. Nested elements with the
/// same tag name end the match early.
fn element_text(html: &str, open: &Regex) -> Option<String> {
    let caps = open.captures(html)?;
    let start = caps.get(0)?.end();
    let close = format!("</{}", caps[1].to_ascii_lowercase());
    let rest = &html[start..];
    let end = rest.to_ascii_lowercase().find(&close)?;
    Some(text_content(&rest[..end]))
}

/// Decoded, whitespace-collapsed text of each text node.
fn text_nodes(html: &str) -> impl Iterator<Item = String> + '_ {
    html.split('<')
        .skip(1)
        .filter_map(|piece| piece.split_once('>').map(|(_, text)| text))
        .map(text_content)
        .filter(|text| !text.is_empty())
}

/// Attributes of an opening tag, names lower-cased.
fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTRIBUTE
        .captures_iter(tag)
        .map(|c| {
            let value = c
                .get(2)
                .or_else(|| c.get(3))
                .or_else(|| c.get(4))
                .map_or("", |m| m.as_str());
            (c[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

/// Strip tags, decode entities and collapse whitespace.
pub fn text_content(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Decode named and numeric character references.
///
/// Unknown named entities are left as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |c: &Captures| {
            let entity = &c[1];
            let decoded = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(entity)
            };
            decoded.map_or_else(|| c[0].to_string(), |ch| ch.to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "rsquo" => '\u{2019}',
        "lsquo" => '\u{2018}',
        "rdquo" => '\u{201d}',
        "ldquo" => '\u{201c}',
        "copy" => '©',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const MOD_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>UI Cheats Extension | Mod The Sims</title>
  <meta property="og:description" content="Fallback description">
  <meta content="Cheat by clicking on the UI &amp; more." name="Description">
  <script>var by = "by Nobody";</script>
  <style>.author { color: red; }</style>
</head>
<body>
  <h1 class="page-title">
    UI Cheats <em>Extension</em>
  </h1>
  <div class="post-author"><a href="/u/1">by weerbesu</a></div>
  <p>First paragraph.</p>
</body>
</html>"#;

    #[test]
    fn test_parse_full_page() {
        let record = parse_html(" https://modthesims.info/d/1 ", MOD_PAGE);
        assert_eq!(record.name, "UI Cheats Extension");
        assert_eq!(record.description, "Cheat by clicking on the UI & more.");
        assert_eq!(record.creator, "weerbesu");
        assert_eq!(record.url, "https://modthesims.info/d/1");
    }

    #[test]
    fn test_name_falls_back_to_title_then_class() {
        let html = "<html><head><title> Better &quot;Exceptions&quot; </title></head></html>";
        assert_eq!(parse_html("u", html).name, "Better \"Exceptions\"");

        let html = r#"<div class="mod-heading"><span>Wonderful Whims</span></div>"#;
        assert_eq!(parse_html("u", html).name, "Wonderful Whims");

        let html = "<h1>  </h1><title>From Title</title>";
        assert_eq!(parse_html("u", html).name, "From Title");
    }

    #[test]
    fn test_og_description_used_without_meta_description() {
        let html = r#"<meta property='og:description' content='Adds a career.'><p>Ignored</p>"#;
        assert_eq!(parse_html("u", html).description, "Adds a career.");
    }

    #[test]
    fn test_description_from_paragraphs() {
        let html = "<p>One.</p><p class=\"x\">Two <b>bold</b>.</p><p></p><p>Three.</p><p>Four.</p>";
        assert_eq!(parse_html("u", html).description, "One. Two bold .");
    }

    #[test]
    fn test_description_truncated() {
        let html = format!("<p>{}</p>", "á".repeat(DESCRIPTION_LIMIT + 50));
        let description = parse_html("u", &html).description;
        assert_eq!(description.chars().count(), DESCRIPTION_LIMIT);
    }

    #[test]
    fn test_creator_from_rel_author() {
        let html = r#"<p>Text</p><a href="/p/2" rel="author">Deaderpool</a>"#;
        assert_eq!(parse_html("u", html).creator, "Deaderpool");
    }

    #[test]
    fn test_creator_from_by_text() {
        let html = "<div><span>Created by LittleMsSam</span></div>";
        assert_eq!(parse_html("u", html).creator, "LittleMsSam");

        let html = "<div><span>Standby mode</span></div>";
        assert_eq!(parse_html("u", html).creator, "");
    }

    #[test]
    fn test_empty_page() {
        let record = parse_html("https://a.com", "");
        assert_eq!(record, ModRecord::empty("https://a.com"));
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#233;&#xE9;&#39;"), "éé'");
        assert_eq!(decode_entities("&unknown; &#xZZ;"), "&unknown; &#xZZ;");
    }

    #[test]
    fn test_text_content() {
        assert_eq!(text_content("  <b>Hello</b>\n\t world &nbsp;!  "), "Hello world !");
    }

    struct FakeExtractor {
        seen: RefCell<Vec<String>>,
    }

    impl Extractor for FakeExtractor {
        fn extract(&self, url: &str) -> Result<ModRecord> {
            self.seen.borrow_mut().push(url.to_string());
            if url.contains("broken") {
                return Err(ModSortError::Extraction {
                    url: url.to_string(),
                    message: "HTTP 500".to_string(),
                });
            }
            if url.contains("blank") {
                return Ok(ModRecord::empty(url));
            }
            Ok(ModRecord::new(format!("Mod {}", url), "", "").with_url(url))
        }
    }

    #[test]
    fn test_extract_batch_keeps_order_and_isolates_failures() {
        let extractor = FakeExtractor {
            seen: RefCell::new(Vec::new()),
        };
        let urls = vec![
            "https://a.com/1".to_string(),
            "https://a.com/broken".to_string(),
            "https://a.com/3".to_string(),
        ];

        let records = extractor.extract_batch(&urls);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Mod https://a.com/1");
        assert_eq!(records[1], ModRecord::empty("https://a.com/broken"));
        assert_eq!(records[2].url, "https://a.com/3");
        assert_eq!(*extractor.seen.borrow(), urls);
    }

    #[test]
    fn test_extract_for_import_fetches_raw_url_and_stores_normalized() {
        let extractor = FakeExtractor {
            seen: RefCell::new(Vec::new()),
        };
        let record = extractor
            .extract_for_import("  https://www.a.com/mods/1/?utm_source=x ")
            .unwrap();
        assert_eq!(
            *extractor.seen.borrow(),
            vec!["https://www.a.com/mods/1/?utm_source=x".to_string()]
        );
        assert_eq!(record.url, "https://a.com/mods/1");
    }

    #[test]
    fn test_extract_for_import_requires_a_name() {
        let extractor = FakeExtractor {
            seen: RefCell::new(Vec::new()),
        };
        assert!(matches!(
            extractor.extract_for_import("https://a.com/blank"),
            Err(ModSortError::Extraction { .. })
        ));
        assert!(matches!(
            extractor.extract_for_import("not a url"),
            Err(ModSortError::InvalidUrl { .. })
        ));
        assert_eq!(extractor.seen.borrow().len(), 1);
    }
}
