use std::collections::BTreeMap;
use std::fmt::Write;

use once_cell::sync::Lazy;

use crate::{
    constants::test_bank_prompt::{
        CONTENT_END_MARKER, CONTENT_START_MARKER, OUTPUT_EXAMPLE, OUTPUT_RULES,
        TEST_BANK_TASK_INTRO,
    },
    errors::{AppError, AppResult},
    models::{
        domain::{ContentPassage, QuestionCounts},
        dto::generated::GeneratedTestBankDto,
    },
};

/// Rough chars-per-token ratio used to turn the token budget into a text budget.
pub const CHARS_PER_TOKEN: usize = 4;

static OUTPUT_SCHEMA: Lazy<String> = Lazy::new(|| {
    serde_json::to_string(&schemars::schema_for!(GeneratedTestBankDto)).unwrap_or_default()
});

pub struct PromptInput<'a> {
    pub title: &'a str,
    pub chapter: &'a str,
    pub passages: &'a [ContentPassage],
    pub learning_objectives: &'a BTreeMap<String, String>,
    pub counts: QuestionCounts,
    pub max_content_chars: usize,
    pub max_input_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    pub text: String,
    pub passages_used: usize,
    pub content_chars: usize,
    pub content_truncated: bool,
}

struct ContentWindow {
    content: String,
    passages_used: usize,
    chars: usize,
    truncated: bool,
}

pub fn build_prompt(input: &PromptInput<'_>) -> AppResult<BuiltPrompt> {
    let frame_chars = render(input, "").chars().count();
    let token_room = (input.max_input_tokens as usize * CHARS_PER_TOKEN).saturating_sub(frame_chars);
    let budget = token_room.min(input.max_content_chars);

    let window = window_passages(input.passages, budget);
    if window.passages_used == 0 {
        return Err(AppError::ValidationError(format!(
            "input budget of {} tokens leaves no room for chapter content",
            input.max_input_tokens
        )));
    }

    if window.truncated {
        log::warn!(
            "Chapter '{}' content truncated to {} chars ({} of {} passages)",
            input.chapter,
            window.chars,
            window.passages_used,
            input.passages.len()
        );
    }

    Ok(BuiltPrompt {
        text: render(input, &window.content),
        passages_used: window.passages_used,
        content_chars: window.chars,
        content_truncated: window.truncated,
    })
}

fn window_passages(passages: &[ContentPassage], budget: usize) -> ContentWindow {
    const SEPARATOR: &str = "\n\n";

    let mut window = ContentWindow {
        content: String::new(),
        passages_used: 0,
        chars: 0,
        truncated: false,
    };

    for passage in passages {
        let text = passage.text.trim();
        let separator = if window.content.is_empty() { "" } else { SEPARATOR };
        let needed = separator.len() + text.chars().count();

        if window.chars + needed <= budget {
            window.content.push_str(separator);
            window.content.push_str(text);
            window.chars += needed;
            window.passages_used += 1;
            continue;
        }

        let remaining = budget.saturating_sub(window.chars + separator.len());
        if remaining > 0 {
            window.content.push_str(separator);
            window.content.extend(text.chars().take(remaining));
            window.chars += separator.len() + remaining;
            window.passages_used += 1;
        }
        window.truncated = true;
        break;
    }

    window
}

fn render(input: &PromptInput<'_>, content: &str) -> String {
    let counts = input.counts;
    let mut prompt = String::with_capacity(content.len() + 4096);

    let _ = writeln!(prompt, "{}\n", TEST_BANK_TASK_INTRO);
    let _ = writeln!(prompt, "BOOK: {}", input.title);
    let _ = writeln!(prompt, "CHAPTER: {}\n", input.chapter);

    let _ = writeln!(prompt, "QUESTION COUNTS");
    let _ = writeln!(
        prompt,
        "Create a total of {} questions, distributed as follows:",
        counts.total
    );
    let _ = writeln!(prompt, "- {} multiple-choice questions (type \"multiple-choice\")", counts.mcq);
    let _ = writeln!(prompt, "- {} true/false questions (type \"true-false\")", counts.tf);
    let _ = writeln!(
        prompt,
        "- {} argumentative essay questions (type \"argument\")\n",
        counts.essay
    );

    let _ = writeln!(prompt, "LEARNING OBJECTIVES");
    if input.learning_objectives.is_empty() {
        let _ = writeln!(
            prompt,
            "No learning objectives were supplied. Set \"learning_objective\" to a short code such as \"LO1\" naming the chapter topic each question targets.\n"
        );
    } else {
        let _ = writeln!(
            prompt,
            "Set \"learning_objective\" to exactly one of these codes:"
        );
        for (code, text) in ordered_objectives(input.learning_objectives) {
            let _ = writeln!(prompt, "- {}: {}", code, text.trim());
        }
        let _ = writeln!(prompt);
    }

    let _ = writeln!(prompt, "SOURCE MATERIAL");
    let _ = writeln!(prompt, "{}", CONTENT_START_MARKER);
    let _ = writeln!(prompt, "{}", content);
    let _ = writeln!(prompt, "{}\n", CONTENT_END_MARKER);

    let _ = writeln!(prompt, "OUTPUT FORMAT");
    let _ = writeln!(prompt, "Return ONLY a JSON object shaped like this example:");
    let _ = writeln!(prompt, "{}\n", OUTPUT_EXAMPLE);
    let _ = writeln!(prompt, "JSON Schema of the object:");
    let _ = writeln!(prompt, "{}\n", OUTPUT_SCHEMA.as_str());
    let _ = write!(prompt, "{}", OUTPUT_RULES);

    prompt
}

/// Objectives in natural order, so "LO2" comes before "LO10".
fn ordered_objectives(objectives: &BTreeMap<String, String>) -> Vec<(&String, &String)> {
    let mut ordered: Vec<_> = objectives.iter().collect();
    ordered.sort_by_key(|(code, _)| natural_key(code));
    ordered
}

fn natural_key(code: &str) -> (String, u64, String) {
    let prefix = code.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = code[prefix.len()..].parse().unwrap_or(0);
    (prefix.to_string(), number, code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::{sample_chapter, sample_objectives};

    fn input<'a>(
        passages: &'a [ContentPassage],
        objectives: &'a BTreeMap<String, String>,
    ) -> PromptInput<'a> {
        PromptInput {
            title: "An Invitation to Health",
            chapter: "Chapter 1 Taking Charge of Your Health",
            passages,
            learning_objectives: objectives,
            counts: QuestionCounts {
                total: 10,
                mcq: 7,
                tf: 2,
                essay: 1,
            },
            max_content_chars: 100_000,
            max_input_tokens: 32_000,
        }
    }

    #[test]
    fn test_prompt_names_every_objective_and_count() {
        let chapter = sample_chapter("Chapter 1");
        let objectives = sample_objectives();
        let built = build_prompt(&input(&chapter.passages, &objectives)).unwrap();

        for (code, text) in &objectives {
            assert!(built.text.contains(&format!("- {}: {}", code, text)));
        }
        assert!(built.text.contains("Create a total of 10 questions"));
        assert!(built.text.contains("- 7 multiple-choice questions"));
        assert!(built.text.contains("- 2 true/false questions"));
        assert!(built.text.contains("- 1 argumentative essay questions"));
        assert!(built.text.contains("\"questions\""));
        assert_eq!(built.passages_used, 3);
        assert!(!built.content_truncated);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let chapter = sample_chapter("Chapter 1");
        let objectives = sample_objectives();

        let first = build_prompt(&input(&chapter.passages, &objectives)).unwrap();
        let second = build_prompt(&input(&chapter.passages, &objectives)).unwrap();

        assert_eq!(first.text, second.text);
    }

    #[test]
    fn test_content_is_windowed_to_char_budget() {
        let chapter = sample_chapter("Chapter 1");
        let objectives = sample_objectives();
        let mut limited = input(&chapter.passages, &objectives);
        limited.max_content_chars = 60;

        let built = build_prompt(&limited).unwrap();

        assert!(built.content_truncated);
        assert_eq!(built.content_chars, 60);
        assert!(built.passages_used >= 1);
        assert!(built.text.contains(CONTENT_END_MARKER));
    }

    #[test]
    fn test_tiny_token_budget_is_rejected() {
        let chapter = sample_chapter("Chapter 1");
        let objectives = sample_objectives();
        let mut limited = input(&chapter.passages, &objectives);
        limited.max_input_tokens = 10;

        let err = build_prompt(&limited).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_window_cuts_on_char_boundary() {
        let passages = vec![ContentPassage {
            text: "Santé é bien-être".to_string(),
            page_number: None,
            page_sequence: None,
        }];

        let window = window_passages(&passages, 6);

        assert_eq!(window.content, "Santé ");
        assert!(window.truncated);
    }

    #[test]
    fn test_objectives_in_natural_order() {
        let objectives: BTreeMap<String, String> = [("LO10", "ten"), ("LO2", "two"), ("LO1", "one")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let codes: Vec<&str> = ordered_objectives(&objectives)
            .into_iter()
            .map(|(code, _)| code.as_str())
            .collect();

        assert_eq!(codes, vec!["LO1", "LO2", "LO10"]);
    }

    #[test]
    fn test_missing_objectives_get_fallback_instruction() {
        let chapter = sample_chapter("Chapter 1");
        let objectives = BTreeMap::new();
        let built = build_prompt(&input(&chapter.passages, &objectives)).unwrap();

        assert!(built.text.contains("No learning objectives were supplied"));
    }
}
