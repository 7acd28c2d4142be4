use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Document the model is instructed to return.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GeneratedTestBankDto {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chapter: Option<String>,
    pub questions: Vec<GeneratedQuestionDto>,
}

/// One question as emitted by the model, before validation.
///
/// Every field is optional so that a single bad entry can be reported and
/// dropped instead of failing deserialization of the whole batch.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GeneratedQuestionDto {
    #[serde(default)]
    pub id: Option<serde_json::Value>,

    /// One of "multiple-choice", "true-false" or "argument".
    #[serde(default, rename = "type", alias = "question_type")]
    pub question_type: Option<String>,

    /// Code of the learning objective this question targets, e.g. "LO1".
    #[serde(default)]
    pub learning_objective: Option<String>,

    /// Question stem, true/false statement or essay prompt.
    #[serde(default, alias = "stem")]
    pub question_text: Option<String>,

    /// Multiple-choice options; omit for other types.
    #[serde(default)]
    pub options: Option<Vec<GeneratedOptionDto>>,

    /// Option label for multiple-choice, "True"/"False" for true-false,
    /// model answer guidance for argument questions.
    #[serde(default)]
    pub correct_answer: Option<serde_json::Value>,

    #[serde(default, alias = "rubric")]
    pub answer_guidance: Option<String>,

    /// Why the answer is correct.
    #[serde(default, alias = "explanation")]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct GeneratedOptionDto {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub correct: Option<bool>,
}
