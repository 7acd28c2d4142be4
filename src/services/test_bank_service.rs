use std::sync::Arc;

use validator::Validate;

use crate::{
    config::Config,
    errors::AppResult,
    models::{
        domain::{QuestionCounts, TestBank},
        dto::{
            request::GenerateTestBankRequest,
            response::{ChaptersResponse, GenerateTestBankResponse, GenerationReport, TitleDto},
        },
    },
    repositories::{ContentRepository, TestBankRepository},
    services::{
        content_service::ContentService,
        generation_service::TextGenerator,
        index_resolver::IndexResolver,
        prompt_builder::{build_prompt, PromptInput},
        response_parser::{parse_questions, ParseOptions},
    },
};

#[derive(Debug, Clone, Copy)]
struct GenerationLimits {
    default_max_chunks: u32,
    default_max_chars: usize,
    max_input_tokens: u32,
}

/// Runs the test-bank pipeline: resolve, retrieve, prompt, generate, parse, persist.
pub struct TestBankService {
    resolver: IndexResolver,
    content: ContentService,
    generator: Arc<dyn TextGenerator>,
    repository: Arc<dyn TestBankRepository>,
    limits: GenerationLimits,
}

impl TestBankService {
    pub fn new(
        config: &Config,
        content_repository: Arc<dyn ContentRepository>,
        generator: Arc<dyn TextGenerator>,
        repository: Arc<dyn TestBankRepository>,
    ) -> Self {
        Self {
            resolver: IndexResolver::new(config.title_index.clone()),
            content: ContentService::new(content_repository),
            generator,
            repository,
            limits: GenerationLimits {
                default_max_chunks: config.default_max_chunks,
                default_max_chars: config.default_max_chars,
                max_input_tokens: config.llm_max_input_tokens,
            },
        }
    }

    pub fn list_titles(&self) -> Vec<TitleDto> {
        self.resolver.titles()
    }

    pub async fn list_chapters(&self, title: &str) -> AppResult<ChaptersResponse> {
        let index = self.resolver.resolve(title)?;
        let (key, chapters) = self.content.list_chapters(index).await?;

        Ok(ChaptersResponse {
            title: title.to_string(),
            index_used: index.to_string(),
            total_chapters: chapters.len(),
            chapters,
            chapter_key_used: key.as_str().to_string(),
        })
    }

    pub async fn list_saved_files(&self) -> AppResult<Vec<String>> {
        self.repository.list().await
    }

    pub async fn generate(
        &self,
        request: GenerateTestBankRequest,
    ) -> AppResult<GenerateTestBankResponse> {
        request.validate()?;

        let index = self.resolver.resolve(&request.title)?.to_string();
        let requested = request.requested_counts();
        if requested.per_type_sum() != requested.total {
            log::warn!(
                "Requested type counts sum to {} but num_total_qs is {}",
                requested.per_type_sum(),
                requested.total
            );
        }

        log::info!(
            "Generating test bank for '{}' / '{}' from index {}",
            request.title,
            request.chapter_name,
            index
        );

        let max_chunks = request.max_chunks.unwrap_or(self.limits.default_max_chunks);
        let retrieved = self
            .content
            .retrieve_chapter(&index, &request.chapter_name, max_chunks)
            .await?;

        let prompt = build_prompt(&PromptInput {
            title: &request.title,
            chapter: &request.chapter_name,
            passages: &retrieved.passages,
            learning_objectives: &request.learning_objectives,
            counts: requested,
            max_content_chars: request.max_chars.unwrap_or(self.limits.default_max_chars),
            max_input_tokens: self.limits.max_input_tokens,
        })?;

        log::info!(
            "Sending {} char prompt ({} of {} passages) to the model",
            prompt.text.len(),
            prompt.passages_used,
            retrieved.passages.len()
        );
        let completion = self.generator.complete(&prompt.text).await?;

        let parsed = parse_questions(
            &completion.text,
            &ParseOptions {
                learning_objectives: &request.learning_objectives,
                max_questions: requested.total as usize,
                output_truncated: completion.truncated,
            },
        )?;

        let mut test_bank = TestBank::new(
            &request.title,
            &request.chapter_name,
            &index,
            parsed.questions,
        );
        let extracted = QuestionCounts::tally(&test_bank.questions);
        let count_mismatch = extracted != requested;

        log::info!(
            "Extracted {} questions ({} dropped, {} requested)",
            extracted.total,
            parsed.dropped.len(),
            requested.total
        );

        let (file_saved, save_error) = if request.save_to_file {
            match self.repository.save(&test_bank).await {
                Ok(file_name) => {
                    test_bank.saved_file = Some(file_name);
                    (true, None)
                }
                Err(e) => {
                    log::warn!("Test bank generated but not saved: {}", e);
                    (false, Some(e.to_string()))
                }
            }
        } else {
            (false, None)
        };

        Ok(GenerateTestBankResponse {
            title: test_bank.title,
            chapter: test_bank.chapter,
            questions: test_bank.questions,
            index_used: test_bank.index_used,
            file_saved,
            saved_file: test_bank.saved_file,
            save_error,
            report: GenerationReport {
                requested,
                extracted,
                dropped: parsed.dropped,
                surplus_discarded: parsed.surplus_discarded,
                count_mismatch,
                output_truncated: completion.truncated,
                content_truncated: prompt.content_truncated,
                passages_retrieved: retrieved.passages.len(),
                passages_used: prompt.passages_used,
            },
        })
    }
}
