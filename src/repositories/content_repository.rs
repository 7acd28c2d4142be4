use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{ChapterSummary, ContentPassage, RetrievedChapter},
};

/// Metadata field that holds chapter titles for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterKey {
    TocLevel1,
    TocLevel2,
}

impl ChapterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterKey::TocLevel1 => "toc_level_1_title",
            ChapterKey::TocLevel2 => "toc_level_2_title",
        }
    }

    pub fn field(&self) -> String {
        format!("metadata.source.metadata.{}.keyword", self.as_str())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Distinct chapter titles in `index` with their chunk counts.
    async fn chapter_buckets(
        &self,
        index: &str,
        key: ChapterKey,
        size: u32,
    ) -> AppResult<Vec<ChapterSummary>>;

    /// Chunks of one chapter in page order, at most `max_chunks`.
    async fn chapter_passages(
        &self,
        index: &str,
        key: ChapterKey,
        chapter: &str,
        max_chunks: u32,
    ) -> AppResult<RetrievedChapter>;
}

/// Content store client speaking the OpenSearch `_search` API.
pub struct OpenSearchContentRepository {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<SecretString>,
}

impl OpenSearchContentRepository {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.content_store_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("failed to build content store client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.content_store_url.trim_end_matches('/').to_string(),
            username: config.content_store_username.clone(),
            password: config.content_store_password.clone(),
        })
    }

    async fn search(&self, index: &str, body: &Value) -> AppResult<SearchResponse> {
        let url = format!("{}/{}/_search", self.base_url, index);
        log::debug!("Querying content store at {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(
                username,
                self.password.as_ref().map(|p| p.expose_secret().to_string()),
            );
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());

            return Err(search_error(status, &text, index));
        }

        response.json::<SearchResponse>().await.map_err(|e| {
            AppError::Upstream(format!("unreadable content store response: {}", e))
        })
    }
}

#[async_trait]
impl ContentRepository for OpenSearchContentRepository {
    async fn chapter_buckets(
        &self,
        index: &str,
        key: ChapterKey,
        size: u32,
    ) -> AppResult<Vec<ChapterSummary>> {
        let response = self.search(index, &chapter_terms_query(key, size)).await?;
        Ok(response.chapter_buckets())
    }

    async fn chapter_passages(
        &self,
        index: &str,
        key: ChapterKey,
        chapter: &str,
        max_chunks: u32,
    ) -> AppResult<RetrievedChapter> {
        let body = chapter_passages_query(key, chapter, max_chunks);
        let response = self.search(index, &body).await?;
        Ok(response.into_retrieved(chapter))
    }
}

/// Maps a non-success `_search` answer onto the error the caller sees.
pub(crate) fn search_error(status: StatusCode, body: &str, index: &str) -> AppError {
    if status == StatusCode::NOT_FOUND && body.contains("index_not_found_exception") {
        return AppError::not_found(format!(
            "Content index '{}' does not exist in the content store",
            index
        ));
    }

    log::warn!("Content store returned {} for index {}", status, index);
    AppError::Upstream(format!(
        "content store returned {}: {}",
        status,
        body.chars().take(300).collect::<String>()
    ))
}

pub(crate) fn chapter_terms_query(key: ChapterKey, size: u32) -> Value {
    json!({
        "size": 0,
        "aggs": {
            "chapter_names": {
                "terms": {
                    "field": key.field(),
                    "size": size
                }
            }
        }
    })
}

pub(crate) fn chapter_passages_query(key: ChapterKey, chapter: &str, max_chunks: u32) -> Value {
    json!({
        "query": {
            "term": { key.field(): chapter }
        },
        "sort": [
            { "metadata.source.metadata.pdf_page_number": "asc" },
            { "metadata.source.metadata.page_sequence": "asc" }
        ],
        "_source": { "excludes": ["embedding"] },
        "size": max_chunks
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    hits: Option<Hits>,
    #[serde(default)]
    aggregations: Option<Aggregations>,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    total: Option<TotalHits>,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Object { value: u64 },
    Count(u64),
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Aggregations {
    chapter_names: TermsAggregation,
}

#[derive(Debug, Deserialize)]
struct TermsAggregation {
    #[serde(default)]
    buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    key: String,
    doc_count: u64,
}

impl SearchResponse {
    fn chapter_buckets(self) -> Vec<ChapterSummary> {
        self.aggregations
            .map(|aggs| {
                aggs.chapter_names
                    .buckets
                    .into_iter()
                    .map(|b| ChapterSummary {
                        name: b.key,
                        doc_count: b.doc_count,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn into_retrieved(self, chapter: &str) -> RetrievedChapter {
        let hits = self.hits.unwrap_or(Hits {
            total: None,
            hits: Vec::new(),
        });

        let passages: Vec<ContentPassage> = hits
            .hits
            .into_iter()
            .filter_map(|hit| {
                let text = hit.source.value?;
                if text.trim().is_empty() {
                    return None;
                }
                let page_field = |name: &str| {
                    hit.source
                        .metadata
                        .as_ref()
                        .and_then(|m| m.pointer(&format!("/source/metadata/{}", name)))
                        .and_then(Value::as_i64)
                };
                Some(ContentPassage {
                    page_number: page_field("pdf_page_number"),
                    page_sequence: page_field("page_sequence"),
                    text,
                })
            })
            .collect();

        let total_hits = match hits.total {
            Some(TotalHits::Object { value }) | Some(TotalHits::Count(value)) => value,
            None => passages.len() as u64,
        };

        RetrievedChapter {
            chapter: chapter.to_string(),
            total_hits,
            passages,
        }
    }
}
