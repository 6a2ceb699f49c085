//! Notion HTTP client
//!
//! Thin blocking wrapper over the four REST endpoints the store needs.
//! Transient failures (connection errors, HTTP 429 and 5xx) are retried with
//! exponential backoff; everything else is returned as is.

use std::time::Duration;

use backon::{BlockingRetryable, ExponentialBuilder};
use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;

use crate::error::{ModSortError, Result};

pub const NOTION_API_URL: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

/// Operations the store performs against Notion
///
/// Implemented by [`NotionClient`] for the real API; tests provide an
/// in-memory implementation.
pub trait NotionTransport {
    /// `POST /databases/{id}/query`, returns the response object.
    fn query_database(&self, database_id: &str, body: &Value) -> Result<Value>;

    /// `GET /pages/{id}`
    fn retrieve_page(&self, page_id: &str) -> Result<Value>;

    /// `POST /pages`, returns the created page.
    fn create_page(&self, body: &Value) -> Result<Value>;

    /// `PATCH /pages/{id}`, returns the updated page.
    fn update_page(&self, page_id: &str, body: &Value) -> Result<Value>;
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }
}

/// Blocking Notion API client
pub struct NotionClient {
    http: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl NotionClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: NOTION_API_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Read the API key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self> {
        let key = std::env::var(var)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModSortError::MissingCredential {
                name: var.to_string(),
            })?;
        Self::new(key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        let send = || self.send_once(method.clone(), &url, body);

        send.retry(self.retry.backoff())
            .when(|e: &ModSortError| e.is_transient())
            .notify(|e: &ModSortError, delay: Duration| {
                log::warn!("Notion {} {} failed: {}; retrying in {:?}", method, path, e, delay);
            })
            .call()
    }

    fn send_once(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        log::debug!("Notion {} {}", method, url);
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json()?);
        }

        let text = response.text().unwrap_or_default();
        Err(ModSortError::NotionApi {
            status: status.as_u16(),
            message: api_error_message(&text),
        })
    }
}

impl NotionTransport for NotionClient {
    fn query_database(&self, database_id: &str, body: &Value) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("databases/{}/query", database_id),
            Some(body),
        )
    }

    fn retrieve_page(&self, page_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("pages/{}", page_id), None)
            .map_err(|e| match e {
                ModSortError::NotionApi { status: 404, .. } => ModSortError::PageNotFound {
                    id: page_id.to_string(),
                },
                other => other,
            })
    }

    fn create_page(&self, body: &Value) -> Result<Value> {
        self.request(Method::POST, "pages", Some(body))
    }

    fn update_page(&self, page_id: &str, body: &Value) -> Result<Value> {
        self.request(Method::PATCH, &format!("pages/{}", page_id), Some(body))
    }
}

/// `message` field of a Notion error body, or the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message_from_json() {
        let body = r#"{"object":"error","status":400,"code":"validation_error","message":"Pasta is not a property that exists."}"#;
        assert_eq!(api_error_message(body), "Pasta is not a property that exists.");
    }

    #[test]
    fn test_api_error_message_from_text() {
        assert_eq!(api_error_message(" Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_missing_api_key() {
        let result = NotionClient::from_env("MODSORT_TEST_UNSET_NOTION_KEY");
        assert!(matches!(
            result,
            Err(ModSortError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.min_delay, Duration::from_secs(2));
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = NotionClient::new("secret")
            .unwrap()
            .with_base_url("http://localhost:9999/v1/");
        assert_eq!(client.base_url, "http://localhost:9999/v1");
    }
}
