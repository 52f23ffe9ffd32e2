//! HTTP client for the Fushigi backend.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{JournalSubmitter, RemoteSource};
use crate::config::{ClientConfig, MAX_PAGE_SIZE};
use crate::error::{RemoteError, RemoteResult};
use crate::models::{
    GrammarPoint, GrammarPointRemote, JournalEntry, JournalEntryRemote, NewJournalEntry, Sentence,
    SentenceRemote,
};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const GRAMMAR_PATH: &str = "/api/grammar";
const JOURNAL_PATH: &str = "/api/journal";
const SENTENCES_PATH: &str = "/api/sentences";

/// Upper bound on pages per collection, in case a server ignores `offset`.
const MAX_PAGES: usize = 1_000;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    page_size: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> RemoteResult<Self> {
        Self::with_settings(base_url.into(), MAX_PAGE_SIZE, Duration::from_secs(10))
    }

    pub fn from_config(config: &ClientConfig) -> RemoteResult<Self> {
        Self::with_settings(
            config.api_base_url.clone(),
            config.page_size,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn with_settings(base_url: String, page_size: usize, timeout: Duration) -> RemoteResult<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Pull a whole collection, one page at a time.
    async fn fetch_paged<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<Vec<T>> {
        let mut items = Vec::new();
        let mut offset = 0usize;

        for _ in 0..MAX_PAGES {
            let url = format!(
                "{}{}?limit={}&offset={}",
                self.base_url, path, self.page_size, offset
            );
            let batch: Vec<T> = self.get_json(&url).await?;
            let count = batch.len();
            items.extend(batch);

            // A short page ends the collection; an oversized one means the
            // server ignored paging and already sent everything
            if count != self.page_size {
                return Ok(items);
            }
            offset += count;
        }

        tracing::warn!("Stopped paging {path} after {MAX_PAGES} pages");
        Ok(items)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> RemoteResult<T> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> RemoteResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RemoteError::Http {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        });
    }
    parse_body(&body)
}

fn parse_body<T: DeserializeOwned>(body: &str) -> RemoteResult<T> {
    serde_json::from_str(body).map_err(|error| RemoteError::Decode(error.to_string()))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
    error: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let detail = payload.detail.map(|detail| match detail {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        });
        if let Some(message) = detail.or(payload.message).or(payload.error) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}

/// Pull the identifier out of a creation response.
///
/// Accepts a bare id (`42`, `"uuid"`) or an object with an `id` field.
fn parse_created_id(body: &str) -> RemoteResult<String> {
    let value: serde_json::Value = parse_body(body)?;
    let id = match value {
        serde_json::Value::Object(mut object) => object.remove("id"),
        other => Some(other),
    };
    match id {
        Some(serde_json::Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
        Some(serde_json::Value::Number(id)) => Ok(id.to_string()),
        _ => Err(RemoteError::Decode(
            "response did not include an entry id".to_string(),
        )),
    }
}

fn normalize_base_url(raw: String) -> RemoteResult<String> {
    let url = normalize_text_option(Some(raw)).ok_or_else(|| {
        RemoteError::InvalidConfiguration("base URL must not be empty".to_string())
    })?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(RemoteError::InvalidConfiguration(
            "base URL must include http:// or https://".to_string(),
        ))
    }
}

impl RemoteSource<GrammarPoint> for ApiClient {
    async fn fetch_all(&self) -> RemoteResult<Vec<GrammarPointRemote>> {
        self.fetch_paged(GRAMMAR_PATH).await
    }
}

impl RemoteSource<JournalEntry> for ApiClient {
    async fn fetch_all(&self) -> RemoteResult<Vec<JournalEntryRemote>> {
        self.fetch_paged(JOURNAL_PATH).await
    }
}

impl RemoteSource<Sentence> for ApiClient {
    async fn fetch_all(&self) -> RemoteResult<Vec<SentenceRemote>> {
        self.fetch_paged(SENTENCES_PATH).await
    }
}

impl JournalSubmitter for ApiClient {
    async fn create_entry(&self, entry: &NewJournalEntry) -> RemoteResult<String> {
        let url = format!("{}{}", self.base_url, JOURNAL_PATH);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(entry)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }
        parse_created_id(&body)
    }
}
