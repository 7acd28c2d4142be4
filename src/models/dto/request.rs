use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::QuestionCounts;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_question_mix"))]
pub struct GenerateTestBankRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 300))]
    pub chapter_name: String,

    // code -> objective text, e.g. "LO1" -> "Define health and wellness."
    #[serde(default)]
    #[validate(custom(function = "validate_learning_objectives"))]
    pub learning_objectives: BTreeMap<String, String>,

    #[serde(default = "default_total_qs")]
    #[validate(range(min = 1, max = 200))]
    pub num_total_qs: u32,

    #[serde(default = "default_mcq_qs")]
    #[validate(range(max = 200))]
    pub num_mcq_qs: u32,

    #[serde(default = "default_tf_qs")]
    #[validate(range(max = 200))]
    pub num_tf_qs: u32,

    #[serde(default = "default_args_qs")]
    #[validate(range(max = 200))]
    pub num_args_qs: u32,

    #[serde(default)]
    pub save_to_file: bool,

    #[validate(range(min = 1, max = 1000))]
    pub max_chunks: Option<u32>,

    #[validate(range(min = 1000, max = 1_000_000))]
    pub max_chars: Option<usize>,
}

impl GenerateTestBankRequest {
    pub fn requested_counts(&self) -> QuestionCounts {
        QuestionCounts {
            total: self.num_total_qs,
            mcq: self.num_mcq_qs,
            tf: self.num_tf_qs,
            essay: self.num_args_qs,
        }
    }
}

fn default_total_qs() -> u32 {
    80
}

fn default_mcq_qs() -> u32 {
    60
}

fn default_tf_qs() -> u32 {
    15
}

fn default_args_qs() -> u32 {
    5
}

fn validate_learning_objectives(
    objectives: &BTreeMap<String, String>,
) -> Result<(), ValidationError> {
    if objectives.len() > 100 {
        return Err(ValidationError::new("too_many_learning_objectives"));
    }

    for (code, text) in objectives {
        let code = code.trim();
        if code.is_empty() || code.len() > 32 || code.contains(':') {
            return Err(ValidationError::new("invalid_learning_objective_code"));
        }
        if text.trim().is_empty() {
            return Err(ValidationError::new("empty_learning_objective_text"));
        }
    }

    Ok(())
}

fn validate_question_mix(request: &GenerateTestBankRequest) -> Result<(), ValidationError> {
    if request.requested_counts().per_type_sum() == 0 {
        return Err(ValidationError::new("no_question_types_requested"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChaptersQuery {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
}
