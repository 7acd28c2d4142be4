//! Turns free-form model output into validated [`Question`]s.
//!
//! Model text is untrusted. Each question is checked on its own: a bad entry
//! is dropped and reported, and the batch only fails when nothing usable is
//! left. Output cut off at the token budget is salvaged object by object.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{Question, QuestionKind, QuestionOption, QuestionType},
        dto::{
            generated::{GeneratedOptionDto, GeneratedQuestionDto},
            response::DroppedQuestion,
        },
    },
};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?(.*?)```").expect("CODE_FENCE is a valid regex pattern")
});

pub struct ParseOptions<'a> {
    /// Objective codes from the request; empty means any code is accepted.
    pub learning_objectives: &'a BTreeMap<String, String>,
    pub max_questions: usize,
    pub output_truncated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedQuestions {
    pub questions: Vec<Question>,
    pub dropped: Vec<DroppedQuestion>,
    pub surplus_discarded: usize,
    /// The document was not valid JSON and questions were recovered one by one.
    pub salvaged: bool,
}

pub fn parse_questions(raw: &str, options: &ParseOptions<'_>) -> AppResult<ParsedQuestions> {
    let body = strip_code_fences(raw);
    let (items, salvaged) = extract_items(&body);

    let mut parsed = ParsedQuestions {
        salvaged,
        ..ParsedQuestions::default()
    };

    for (position, item) in items.into_iter().enumerate() {
        match item.and_then(|value| validate_question(value, options)) {
            Ok(question) => parsed.questions.push(question),
            Err(reason) => {
                log::warn!("Dropping generated question #{}: {}", position + 1, reason);
                parsed.dropped.push(DroppedQuestion {
                    position: position + 1,
                    reason,
                });
            }
        }
    }

    if parsed.questions.len() > options.max_questions {
        parsed.surplus_discarded = parsed.questions.len() - options.max_questions;
        parsed.questions.truncate(options.max_questions);
    }

    for (i, question) in parsed.questions.iter_mut().enumerate() {
        question.id = (i + 1).to_string();
    }

    if parsed.questions.is_empty() {
        let detail = if options.output_truncated {
            "model output was truncated at the token budget before any complete question"
                .to_string()
        } else {
            format!(
                "no valid questions could be extracted ({} rejected)",
                parsed.dropped.len()
            )
        };
        return Err(AppError::GenerationError(detail));
    }

    Ok(parsed)
}

/// Keeps the contents of markdown code fences, or the trimmed text when there are none.
fn strip_code_fences(raw: &str) -> String {
    let fenced: Vec<&str> = CODE_FENCE
        .captures_iter(raw)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if !fenced.is_empty() {
        return fenced.concat().trim().to_string();
    }

    let trimmed = raw.trim();
    // an opening fence whose closing fence never arrived
    if trimmed.starts_with("```") {
        return trimmed
            .split_once('\n')
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();
    }
    trimmed.to_string()
}

fn extract_items(body: &str) -> (Vec<Result<Value, String>>, bool) {
    match serde_json::from_str::<Value>(json_slice(body)) {
        Ok(Value::Object(mut document)) => match document.remove("questions") {
            Some(Value::Array(items)) => (items.into_iter().map(Ok).collect(), false),
            _ => (Vec::new(), false),
        },
        Ok(Value::Array(items)) => (items.into_iter().map(Ok).collect(), false),
        Ok(_) => (Vec::new(), false),
        Err(e) => {
            log::warn!("Model output is not valid JSON ({}), salvaging questions", e);
            (salvage_question_objects(body), true)
        }
    }
}

/// Span from the first opening bracket to the last closing one, dropping chatter around the JSON.
fn json_slice(body: &str) -> &str {
    let start = body.find(['{', '[']);
    let end = body.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// Pulls every complete top-level object out of the `questions` array of a broken document.
fn salvage_question_objects(body: &str) -> Vec<Result<Value, String>> {
    let array_start = body
        .find("\"questions\"")
        .and_then(|key| body[key..].find('[').map(|offset| key + offset))
        .or_else(|| body.find('['));

    let Some(array_start) = array_start else {
        return Vec::new();
    };

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut object_start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in body[array_start + 1..].char_indices() {
        let i = array_start + 1 + offset;

        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    object_start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(start) = object_start.take() {
                        items.push(
                            serde_json::from_str::<Value>(&body[start..=i])
                                .map_err(|e| format!("unparseable question object: {}", e)),
                        );
                    }
                }
            }
            ']' if depth == 0 => break,
            _ => {}
        }
    }

    if object_start.is_some() {
        items.push(Err("incomplete question object at end of output".to_string()));
    }

    items
}

fn validate_question(value: Value, options: &ParseOptions<'_>) -> Result<Question, String> {
    if !value.is_object() {
        return Err("question entry is not a JSON object".to_string());
    }

    let raw: GeneratedQuestionDto =
        serde_json::from_value(value).map_err(|e| format!("malformed question object: {}", e))?;

    let declared_type = non_empty(raw.question_type.as_deref()).ok_or("missing question type")?;
    let question_type = QuestionType::parse(declared_type)
        .ok_or_else(|| format!("unknown question type '{}'", declared_type))?;

    let learning_objective =
        normalize_objective(raw.learning_objective.as_deref(), options.learning_objectives)?;

    let question_text = non_empty(raw.question_text.as_deref())
        .ok_or("missing question_text")?
        .to_string();

    let rationale = non_empty(raw.rationale.as_deref()).map(str::to_string);

    let kind = match question_type {
        QuestionType::Mcq => {
            let (options, correct_option) =
                validate_options(raw.options.unwrap_or_default(), raw.correct_answer.as_ref())?;
            QuestionKind::Mcq {
                question_text,
                options,
                correct_option,
                rationale: rationale.ok_or("multiple-choice question has no rationale")?,
            }
        }
        QuestionType::Tf => QuestionKind::Tf {
            question_text,
            correct_answer: boolean_answer(raw.correct_answer.as_ref())?,
            rationale,
        },
        QuestionType::Essay => {
            let guidance = non_empty(raw.answer_guidance.as_deref())
                .or_else(|| non_empty(raw.correct_answer.as_ref().and_then(Value::as_str)))
                .ok_or("essay question has no answer guidance")?;
            QuestionKind::Essay {
                question_text,
                answer_guidance: guidance.to_string(),
                rationale,
            }
        }
    };

    Ok(Question {
        id: String::new(),
        learning_objective,
        kind,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Reduces "LO1: Define health." to "LO1" and checks it against the requested codes.
fn normalize_objective(
    value: Option<&str>,
    allowed: &BTreeMap<String, String>,
) -> Result<String, String> {
    let value = non_empty(value).ok_or("missing learning_objective")?;
    let code = value.split(':').next().unwrap_or(value).trim();
    if code.is_empty() {
        return Err("missing learning_objective".to_string());
    }

    if allowed.is_empty() {
        return Ok(code.to_string());
    }

    let squash = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_uppercase)
            .collect()
    };
    let wanted = squash(code);

    allowed
        .keys()
        .find(|key| squash(key) == wanted)
        .cloned()
        .ok_or_else(|| format!("learning objective '{}' was not requested", code))
}

fn validate_options(
    raw_options: Vec<GeneratedOptionDto>,
    correct_answer: Option<&Value>,
) -> Result<(Vec<QuestionOption>, String), String> {
    if raw_options.len() < 2 {
        return Err(format!(
            "multiple-choice question needs at least 2 options, got {}",
            raw_options.len()
        ));
    }

    let mut options = Vec::with_capacity(raw_options.len());
    let mut flagged = Vec::new();
    let mut seen = HashSet::new();

    for (i, option) in raw_options.into_iter().enumerate() {
        let label = match non_empty(option.label.as_deref()) {
            Some(label) => label.to_string(),
            None => default_label(i),
        };
        let text = non_empty(option.text.as_deref())
            .ok_or_else(|| format!("option {} has no text", label))?
            .to_string();

        if !seen.insert(label.to_uppercase()) {
            return Err(format!("duplicate option label '{}'", label));
        }
        if option.correct == Some(true) {
            flagged.push(label.clone());
        }
        options.push(QuestionOption { label, text });
    }

    let correct_option = match correct_answer {
        Some(Value::String(answer)) => {
            let wanted = answer_label(answer);
            let label = options
                .iter()
                .find(|o| o.label.eq_ignore_ascii_case(wanted))
                .map(|o| o.label.clone())
                .ok_or_else(|| format!("correct_answer '{}' matches no option", answer.trim()))?;

            // correct flags, when present, must single out the same option
            if !flagged.is_empty() && (flagged.len() != 1 || flagged[0] != label) {
                return Err(format!(
                    "conflicting correct answers: correct_answer is '{}' but options {} are flagged",
                    label,
                    flagged.join(", ")
                ));
            }
            label
        }
        Some(Value::Null) | None => match flagged.as_slice() {
            [only] => only.clone(),
            [] => return Err("multiple-choice question has no correct answer".to_string()),
            _ => return Err("multiple-choice question marks several options correct".to_string()),
        },
        Some(other) => return Err(format!("correct_answer {} is not an option label", other)),
    };

    Ok((options, correct_option))
}

fn default_label(position: usize) -> String {
    char::from_u32('A' as u32 + position as u32)
        .map(String::from)
        .unwrap_or_else(|| (position + 1).to_string())
}

/// "A", "a.", "(B)" or "C) Some text" -> the bare label.
fn answer_label(answer: &str) -> &str {
    let trimmed = answer.trim().trim_start_matches('(');
    trimmed
        .split(|c: char| c == '.' || c == ')' || c == ':' || c.is_whitespace())
        .next()
        .unwrap_or(trimmed)
}

fn boolean_answer(value: Option<&Value>) -> Result<bool, String> {
    match value {
        Some(Value::Bool(answer)) => Ok(*answer),
        Some(Value::String(answer)) => match answer.trim().to_lowercase().as_str() {
            "true" | "t" => Ok(true),
            "false" | "f" => Ok(false),
            other => Err(format!("true/false answer '{}' is not a boolean", other)),
        },
        _ => Err("true/false question needs a single boolean answer".to_string()),
    }
}
