use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, FinishReason,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use secrecy::ExposeSecret;

use crate::{
    config::Config,
    constants::test_bank_prompt::TEST_BANK_SYSTEM_PROMPT,
    errors::{AppError, AppResult},
};

/// Raw model output for one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    /// The model stopped because it hit the output-token budget.
    pub truncated: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<Completion>;
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_output_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.llm_api_key.expose_secret())
            .with_api_base(&config.llm_api_base);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model.clone(),
            max_output_tokens: config.llm_max_output_tokens,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, prompt: &str) -> AppResult<Completion> {
        log::debug!(
            "Calling model {} with a {} char prompt",
            self.model_name,
            prompt.len()
        );

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(TEST_BANK_SYSTEM_PROMPT)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .max_completion_tokens(self.max_output_tokens)
            .build()?;

        // streamed so long generations are not cut off by idle read timeouts
        let mut stream = self.client.chat().create_stream(request).await?;

        let mut text = String::new();
        let mut finish_reason = None;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                log::warn!("Model stream failed after {} chars: {}", text.len(), e);
                AppError::from(e)
            })?;
            for choice in chunk.choices {
                if let Some(delta) = choice.delta.content {
                    text.push_str(&delta);
                }
                if choice.finish_reason.is_some() {
                    finish_reason = choice.finish_reason;
                }
            }
        }

        finish_completion(text, finish_reason, self.max_output_tokens)
    }
}

/// Turns the accumulated stream into a [`Completion`], flagging a `length` stop.
fn finish_completion(
    text: String,
    finish_reason: Option<FinishReason>,
    max_output_tokens: u32,
) -> AppResult<Completion> {
    if text.trim().is_empty() {
        return Err(AppError::GenerationError(
            "model returned an empty response".to_string(),
        ));
    }

    let truncated = matches!(finish_reason, Some(FinishReason::Length));
    if truncated {
        log::warn!(
            "Model output hit the {} token budget and was truncated",
            max_output_tokens
        );
    }

    log::debug!("Model returned {} chars", text.len());
    Ok(Completion { text, truncated })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response_is_generation_error() {
        for text in ["", "  \n\t "] {
            let err = finish_completion(text.to_string(), Some(FinishReason::Stop), 100)
                .unwrap_err();
            assert!(matches!(err, AppError::GenerationError(_)));
        }
    }

    #[test]
    fn test_length_finish_marks_truncation() {
        let completion = finish_completion(
            "{\"questions\": [".to_string(),
            Some(FinishReason::Length),
            100,
        )
        .unwrap();

        assert!(completion.truncated);
        assert_eq!(completion.text, "{\"questions\": [");
    }

    #[test]
    fn test_normal_finish_is_not_truncated() {
        for reason in [Some(FinishReason::Stop), None] {
            let completion = finish_completion("{}".to_string(), reason, 100).unwrap();
            assert!(!completion.truncated);
        }
    }

    #[test]
    fn test_generator_builds_from_config() {
        let generator = OpenAiGenerator::new(&Config::test_config());
        assert_eq!(generator.model_name, "test-model");
        assert_eq!(generator.max_output_tokens, 4_000);
    }
}
