use std::sync::Arc;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{ChapterSummary, RetrievedChapter},
    repositories::{ChapterKey, ContentRepository},
};

const MAX_CHAPTER_BUCKETS: u32 = 200;

pub struct ContentService {
    repository: Arc<dyn ContentRepository>,
}

impl ContentService {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// Picks the TOC level that holds chapter titles for this index.
    ///
    /// Some books file chapters under part headings, so level 2 is used when
    /// any of its titles mention a chapter.
    pub async fn chapter_key(&self, index: &str) -> AppResult<ChapterKey> {
        let level_two = self
            .repository
            .chapter_buckets(index, ChapterKey::TocLevel2, MAX_CHAPTER_BUCKETS)
            .await?;

        let key = if level_two
            .iter()
            .any(|bucket| bucket.name.to_lowercase().contains("chapter"))
        {
            ChapterKey::TocLevel2
        } else {
            ChapterKey::TocLevel1
        };

        log::debug!("Index {} uses chapter key {}", index, key.as_str());
        Ok(key)
    }

    pub async fn list_chapters(&self, index: &str) -> AppResult<(ChapterKey, Vec<ChapterSummary>)> {
        let key = self.chapter_key(index).await?;
        let chapters = self
            .repository
            .chapter_buckets(index, key, MAX_CHAPTER_BUCKETS)
            .await?;
        Ok((key, chapters))
    }

    pub async fn retrieve_chapter(
        &self,
        index: &str,
        chapter: &str,
        max_chunks: u32,
    ) -> AppResult<RetrievedChapter> {
        let key = self.chapter_key(index).await?;
        let retrieved = self
            .repository
            .chapter_passages(index, key, chapter, max_chunks)
            .await?;

        if retrieved.passages.is_empty() {
            // best effort: the caller gets the chapter names when the listing works
            let available = self
                .repository
                .chapter_buckets(index, key, MAX_CHAPTER_BUCKETS)
                .await
                .map(|chapters| chapters.into_iter().map(|c| c.name).collect())
                .unwrap_or_default();

            return Err(AppError::not_found_with(
                format!("No content found for chapter '{}' in index '{}'", chapter, index),
                available,
            ));
        }

        log::info!(
            "Retrieved {} passages ({} hits) for chapter '{}'",
            retrieved.passages.len(),
            retrieved.total_hits,
            chapter
        );
        Ok(retrieved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repositories::content_repository::MockContentRepository,
        test_utils::fixtures::{sample_chapter, summaries},
    };
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_chapter_key_prefers_level_two_with_chapters() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_chapter_buckets()
            .with(eq("idx"), eq(ChapterKey::TocLevel2), eq(MAX_CHAPTER_BUCKETS))
            .returning(|_, _, _| Ok(summaries(&["Part One", "Chapter 3 Nutrition"])));

        let service = ContentService::new(Arc::new(repository));
        assert_eq!(service.chapter_key("idx").await.unwrap(), ChapterKey::TocLevel2);
    }

    #[tokio::test]
    async fn test_chapter_key_falls_back_to_level_one() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_chapter_buckets()
            .returning(|_, _, _| Ok(summaries(&["Introduction", "Key Terms"])));

        let service = ContentService::new(Arc::new(repository));
        assert_eq!(service.chapter_key("idx").await.unwrap(), ChapterKey::TocLevel1);
    }

    #[tokio::test]
    async fn test_retrieve_returns_passages_in_order() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_chapter_buckets()
            .returning(|_, _, _| Ok(Vec::new()));
        repository
            .expect_chapter_passages()
            .with(eq("idx"), eq(ChapterKey::TocLevel1), eq("Chapter 1"), eq(10))
            .times(1)
            .returning(|_, _, chapter, _| Ok(sample_chapter(chapter)));

        let service = ContentService::new(Arc::new(repository));
        let retrieved = service.retrieve_chapter("idx", "Chapter 1", 10).await.unwrap();

        assert_eq!(retrieved.passages.len(), 3);
        assert!(retrieved.passages[0].text.starts_with("Health is"));
    }

    #[tokio::test]
    async fn test_empty_chapter_is_not_found_with_alternatives() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_chapter_buckets()
            .returning(|_, _, _| Ok(summaries(&["Chapter 1 Taking Charge of Your Health"])));
        repository
            .expect_chapter_passages()
            .returning(|_, _, chapter, _| {
                Ok(RetrievedChapter {
                    chapter: chapter.to_string(),
                    total_hits: 0,
                    passages: Vec::new(),
                })
            });

        let service = ContentService::new(Arc::new(repository));
        let err = service.retrieve_chapter("idx", "Chapter 99", 10).await.unwrap_err();

        match err {
            AppError::NotFound { available, .. } => {
                assert_eq!(available, vec!["Chapter 1 Taking Charge of Your Health"]);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_store_outage_is_upstream() {
        let mut repository = MockContentRepository::new();
        repository
            .expect_chapter_buckets()
            .returning(|_, _, _| Err(AppError::Upstream("connection refused".into())));

        let service = ContentService::new(Arc::new(repository));
        let err = service.retrieve_chapter("idx", "Chapter 1", 10).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
    }
}
