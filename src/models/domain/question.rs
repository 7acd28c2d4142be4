use serde::{Deserialize, Serialize};

/// A validated test-bank question. Only the response parser creates these.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub learning_objective: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QuestionKind {
    Mcq {
        question_text: String,
        options: Vec<QuestionOption>,
        correct_option: String, // label of the single correct option
        rationale: String,
    },
    Tf {
        question_text: String,
        correct_answer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
    Essay {
        question_text: String,
        answer_guidance: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionOption {
    pub label: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Mcq,
    Tf,
    Essay,
}

impl QuestionType {
    /// Maps the spellings models use for a question type onto a variant.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "mcq" | "multiple-choice" | "multiplechoice" => Some(QuestionType::Mcq),
            "tf" | "true-false" | "truefalse" | "true/false" | "boolean" => Some(QuestionType::Tf),
            "essay" | "argument" | "argumentative" | "argumentative-essay" => {
                Some(QuestionType::Essay)
            }
            _ => None,
        }
    }
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Mcq { .. } => QuestionType::Mcq,
            QuestionKind::Tf { .. } => QuestionType::Tf,
            QuestionKind::Essay { .. } => QuestionType::Essay,
        }
    }

    pub fn question_text(&self) -> &str {
        match self {
            QuestionKind::Mcq { question_text, .. }
            | QuestionKind::Tf { question_text, .. }
            | QuestionKind::Essay { question_text, .. } => question_text,
        }
    }
}

/// Number of questions per type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub struct QuestionCounts {
    pub total: u32,
    pub mcq: u32,
    pub tf: u32,
    pub essay: u32,
}

impl QuestionCounts {
    pub fn tally(questions: &[Question]) -> Self {
        questions
            .iter()
            .fold(QuestionCounts::default(), |mut counts, question| {
                counts.total += 1;
                match question.kind.question_type() {
                    QuestionType::Mcq => counts.mcq += 1,
                    QuestionType::Tf => counts.tf += 1,
                    QuestionType::Essay => counts.essay += 1,
                }
                counts
            })
    }

    pub fn per_type_sum(&self) -> u32 {
        self.mcq + self.tf + self.essay
    }
}
