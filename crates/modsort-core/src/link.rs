//! URL helpers
//!
//! Normalization used to match a mod page against the `Link` property of the
//! Notion database, plus page-id extraction from Notion share links.

use url::{form_urlencoded, Url};

use crate::error::{ModSortError, Result};

/// Query parameters dropped during normalization (plus every `utm_*`).
const TRACKING_PARAMS: &[&str] = &["ref", "fbclid", "gclid"];

/// Normalize a mod URL for comparison.
///
/// - missing scheme is treated as `https://`
/// - scheme and host lower-cased, leading `www.` removed
/// - trailing slashes removed from the path
/// - tracking parameters (`utm_*`, `ref`, `fbclid`, `gclid`) removed
/// - fragment dropped
///
/// Normalizing an already normalized URL returns it unchanged.
pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid_url(input, "empty URL"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed = Url::parse(&candidate).map_err(|e| invalid_url(input, &e.to_string()))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| invalid_url(input, "missing host"))?
        .to_lowercase();
    let mut host = host.as_str();
    while let Some(rest) = host.strip_prefix("www.") {
        host = rest;
    }
    if host.is_empty() {
        return Err(invalid_url(input, "missing host"));
    }

    let mut normalized = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        normalized.push_str(&format!(":{}", port));
    }
    normalized.push_str(parsed.path().trim_end_matches('/'));

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if !kept.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        normalized.push('?');
        normalized.push_str(&query);
    }

    Ok(normalized)
}

/// Normalize, falling back to the trimmed input when it cannot be parsed.
pub fn normalize_url_lossy(input: &str) -> String {
    normalize_url(input).unwrap_or_else(|e| {
        log::debug!("{}", e);
        input.trim().to_string()
    })
}

/// URL without query string and fragment.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Host and path of a URL, without scheme, query or fragment.
///
/// Used for substring matching against stored links, so that
/// `https://www.host/path/` still matches `host/path`.
pub fn match_key(url: &str) -> &str {
    let without_query = strip_query(url);
    without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest)
}

/// Whether two links point at the same mod page.
///
/// Both sides are normalized and compared without their scheme, so
/// `http://` and `https://` variants of a page are the same mod.
pub fn same_mod_url(a: &str, b: &str) -> bool {
    let a = normalize_url_lossy(a);
    let b = normalize_url_lossy(b);
    !a.is_empty() && without_scheme(&a) == without_scheme(&b)
}

fn without_scheme(url: &str) -> &str {
    url.split_once("://").map_or(url, |(_, rest)| rest)
}

/// Whether a search query should be treated as a URL.
pub fn is_url(query: &str) -> bool {
    let lower = query.trim_start().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}

/// Extract the page id from a Notion page URL.
///
/// Handles `www.notion.so/<workspace>/<Title>-<id>`,
/// `<user>.notion.site/<Title>-<id>` and the `?p=<id>` form.
/// Returns the id in dashed UUID form.
pub fn notion_page_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    if !(host == "notion.so" || host.ends_with(".notion.so") || host.ends_with("notion.site")) {
        return None;
    }

    let from_path = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .and_then(|segment| segment.rsplit('-').next())
        .and_then(dashed_uuid);
    if from_path.is_some() {
        return from_path;
    }

    parsed
        .query_pairs()
        .find(|(key, _)| key == "p")
        .and_then(|(_, value)| dashed_uuid(&value))
}

fn dashed_uuid(raw: &str) -> Option<String> {
    if raw.len() != 32 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let id = raw.to_lowercase();
    Some(format!(
        "{}-{}-{}-{}-{}",
        &id[0..8],
        &id[8..12],
        &id[12..16],
        &id[16..20],
        &id[20..]
    ))
}

fn invalid_url(url: &str, message: &str) -> ModSortError {
    ModSortError::InvalidUrl {
        url: url.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_equivalence() {
        let a = normalize_url("HTTP://WWW.Example.com/Path/?utm_source=x").unwrap();
        let b = normalize_url("http://example.com/Path").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "http://example.com/Path");
    }

    #[test]
    fn test_normalize_idempotent() {
        let urls = [
            "https://www.modthesims.info/d/123456/?utm_medium=social&sort=new#comments",
            "https://www.patreon.com/posts/mod-99?ref=feed",
            "http://example.com/",
            "example.com/a//",
            "https://example.com:8443/x?q=a+b&fbclid=zzz",
            "https://www.www.example.com/a",
            "WWW.WWW.WWW.example.com/",
        ];
        for url in urls {
            let once = normalize_url(url).unwrap();
            let twice = normalize_url(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", url);
        }
    }

    #[test]
    fn test_tracking_params_removed_others_kept() {
        let url = "https://www.modthesims.info/d/123456/?utm_medium=social&sort=new&fbclid=1&gclid=2&ref=x";
        assert_eq!(
            normalize_url(url).unwrap(),
            "https://modthesims.info/d/123456?sort=new"
        );
    }

    #[test]
    fn test_missing_scheme_and_port() {
        assert_eq!(
            normalize_url("WWW.Example.com/Mods/").unwrap(),
            "https://example.com/Mods"
        );
        assert_eq!(
            normalize_url("https://example.com:8443/x").unwrap(),
            "https://example.com:8443/x"
        );
        assert_eq!(
            normalize_url("https://example.com:443/x").unwrap(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_root_path() {
        assert_eq!(normalize_url("https://www.example.com/").unwrap(), "https://example.com");
    }

    #[test]
    fn test_invalid_url() {
        assert!(normalize_url("").is_err());
        assert!(normalize_url("http://").is_err());
        assert_eq!(normalize_url_lossy("  not a url at all "), "not a url at all");
    }

    #[test]
    fn test_repeated_www_labels() {
        assert_eq!(
            normalize_url("https://www.www.example.com/a").unwrap(),
            "https://example.com/a"
        );
        assert!(normalize_url("https://www.www./a").is_err());
    }

    #[test]
    fn test_same_mod_url() {
        assert!(same_mod_url(
            "https://www.modthesims.info/d/123/",
            "http://modthesims.info/d/123?utm_source=x"
        ));
        assert!(!same_mod_url(
            "https://modthesims.info/d/1234",
            "https://modthesims.info/d/123"
        ));
        assert!(!same_mod_url(
            "https://a.com/view?id=1",
            "https://a.com/view?id=2"
        ));
        assert!(!same_mod_url("", ""));
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("https://a.com/x?y=1"), "https://a.com/x");
        assert_eq!(strip_query("https://a.com/x#frag"), "https://a.com/x");
        assert_eq!(strip_query("https://a.com/x"), "https://a.com/x");
    }

    #[test]
    fn test_match_key() {
        assert_eq!(match_key("https://modthesims.info/d/1?sort=new"), "modthesims.info/d/1");
        assert_eq!(match_key("modthesims.info/d/1"), "modthesims.info/d/1");
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://modthesims.info"));
        assert!(is_url("HTTP://example.com"));
        assert!(!is_url("MC Command Center"));
    }

    #[test]
    fn test_notion_page_id_from_workspace_url() {
        let url = "https://www.notion.so/myspace/Better-Exceptions-0123456789abcdef0123456789ABCDEF?v=1";
        assert_eq!(
            notion_page_id(url).as_deref(),
            Some("01234567-89ab-cdef-0123-456789abcdef")
        );
    }

    #[test]
    fn test_notion_page_id_from_public_site() {
        let url = "https://someone.notion.site/Mod-List-fedcba9876543210fedcba9876543210";
        assert_eq!(
            notion_page_id(url).as_deref(),
            Some("fedcba98-7654-3210-fedc-ba9876543210")
        );
    }

    #[test]
    fn test_notion_page_id_from_query() {
        let url = "https://www.notion.so/myspace/abc?p=0123456789abcdef0123456789abcdef&pm=s";
        assert_eq!(
            notion_page_id(url).as_deref(),
            Some("01234567-89ab-cdef-0123-456789abcdef")
        );
    }

    #[test]
    fn test_notion_page_id_rejects_other_hosts() {
        assert_eq!(
            notion_page_id("https://example.com/x-0123456789abcdef0123456789abcdef"),
            None
        );
        assert_eq!(notion_page_id("https://www.notion.so/myspace/no-id"), None);
    }
}
