use std::collections::BTreeMap;

use crate::models::{
    domain::{ChapterSummary, ContentPassage, Question, QuestionKind, QuestionOption, RetrievedChapter},
    dto::request::GenerateTestBankRequest,
};

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use std::path::PathBuf;

    /// Learning objectives LO1 to LO3 for the health chapter.
    pub fn sample_objectives() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("LO1".to_string(), "Define health and wellness.".to_string()),
            (
                "LO2".to_string(),
                "Describe the dimensions of wellness.".to_string(),
            ),
            (
                "LO3".to_string(),
                "Explain how behavior change improves health.".to_string(),
            ),
        ])
    }

    /// A 10 question request against the first chapter of the health book.
    pub fn sample_request() -> GenerateTestBankRequest {
        GenerateTestBankRequest {
            title: "An Invitation to Health".to_string(),
            chapter_name: "Chapter 1 Taking Charge of Your Health".to_string(),
            learning_objectives: sample_objectives(),
            num_total_qs: 10,
            num_mcq_qs: 7,
            num_tf_qs: 2,
            num_args_qs: 1,
            save_to_file: false,
            max_chunks: None,
            max_chars: None,
        }
    }

    pub fn sample_chapter(chapter: &str) -> RetrievedChapter {
        let texts = [
            "Health is more than the absence of disease. It is a process of making choices that support physical, mental and social well-being.",
            "Wellness has several dimensions: physical, psychological, spiritual, social, intellectual, environmental and occupational.",
            "Changing a behavior takes time. People move through stages from precontemplation to maintenance.",
        ];

        RetrievedChapter {
            chapter: chapter.to_string(),
            total_hits: texts.len() as u64,
            passages: texts
                .iter()
                .enumerate()
                .map(|(i, text)| ContentPassage {
                    text: text.to_string(),
                    page_number: Some(i as i64 + 1),
                    page_sequence: Some(i as i64),
                })
                .collect(),
        }
    }

    /// Chapter buckets with three documents each.
    pub fn summaries(names: &[&str]) -> Vec<ChapterSummary> {
        names
            .iter()
            .map(|name| ChapterSummary {
                name: name.to_string(),
                doc_count: 3,
            })
            .collect()
    }

    /// Model output with three multiple-choice, one true/false and one essay question.
    pub fn sample_model_output() -> String {
        serde_json::json!({
            "title": "An Invitation to Health",
            "chapter": "Chapter 1 Taking Charge of Your Health",
            "questions": [
                {
                    "id": "1",
                    "type": "multiple-choice",
                    "learning_objective": "LO1",
                    "question_text": "Which statement best describes health?",
                    "options": [
                        { "label": "A", "text": "The absence of disease" },
                        { "label": "B", "text": "A process of choices supporting well-being" },
                        { "label": "C", "text": "A fixed genetic trait" },
                        { "label": "D", "text": "Physical fitness only" }
                    ],
                    "correct_answer": "B",
                    "rationale": "Health is described as a process of making choices."
                },
                {
                    "id": "2",
                    "type": "multiple-choice",
                    "learning_objective": "LO2",
                    "question_text": "Which is a dimension of wellness?",
                    "options": [
                        { "label": "A", "text": "Occupational" },
                        { "label": "B", "text": "Financial leverage" },
                        { "label": "C", "text": "Celebrity" },
                        { "label": "D", "text": "Luck" }
                    ],
                    "correct_answer": "A",
                    "rationale": "Occupational wellness is one of the listed dimensions."
                },
                {
                    "id": "3",
                    "type": "multiple-choice",
                    "learning_objective": "LO3",
                    "question_text": "Which stage comes first in behavior change?",
                    "options": [
                        { "label": "A", "text": "Maintenance" },
                        { "label": "B", "text": "Action" },
                        { "label": "C", "text": "Precontemplation" },
                        { "label": "D", "text": "Preparation" }
                    ],
                    "correct_answer": "C",
                    "rationale": "People move from precontemplation toward maintenance."
                },
                {
                    "id": "4",
                    "type": "true-false",
                    "learning_objective": "LO2",
                    "question_text": "Wellness has only a physical dimension.",
                    "correct_answer": "False",
                    "rationale": "Wellness has several dimensions."
                },
                {
                    "id": "5",
                    "type": "argument",
                    "learning_objective": "LO3",
                    "question_text": "Argue whether behavior change is mainly a matter of willpower.",
                    "answer_guidance": "Strong answers use the stages of change and cite the time change takes."
                }
            ]
        })
        .to_string()
    }

    pub fn sample_questions() -> Vec<Question> {
        vec![
            Question {
                id: "1".to_string(),
                learning_objective: "LO1".to_string(),
                kind: QuestionKind::Mcq {
                    question_text: "Which statement best describes health?".to_string(),
                    options: vec![
                        QuestionOption {
                            label: "A".to_string(),
                            text: "The absence of disease".to_string(),
                        },
                        QuestionOption {
                            label: "B".to_string(),
                            text: "A process of choices supporting well-being".to_string(),
                        },
                    ],
                    correct_option: "B".to_string(),
                    rationale: "Health is described as a process of making choices.".to_string(),
                },
            },
            Question {
                id: "2".to_string(),
                learning_objective: "LO2".to_string(),
                kind: QuestionKind::Tf {
                    question_text: "Wellness has only a physical dimension.".to_string(),
                    correct_answer: false,
                    rationale: None,
                },
            },
            Question {
                id: "3".to_string(),
                learning_objective: "LO3".to_string(),
                kind: QuestionKind::Essay {
                    question_text: "Argue whether behavior change is mainly willpower.".to_string(),
                    answer_guidance: "Cite the stages of change.".to_string(),
                    rationale: None,
                },
            },
        ]
    }

    /// A fresh directory path under the system temp dir; not created.
    pub fn temp_output_dir() -> PathBuf {
        std::env::temp_dir().join(format!("testgen-server-{}", uuid::Uuid::new_v4()))
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use actix_web::http::StatusCode;

    use crate::{
        app_state::AppState,
        config::Config,
        repositories::{
            content_repository::MockContentRepository,
            test_bank_repository::MockTestBankRepository,
        },
        services::generation_service::MockTextGenerator,
    };

    /// App state over mocked backends.
    pub fn state_with(
        content: MockContentRepository,
        generator: MockTextGenerator,
        repository: MockTestBankRepository,
    ) -> AppState {
        AppState::with_backends(
            Config::test_config(),
            Arc::new(content),
            Arc::new(generator),
            Arc::new(repository),
        )
    }

    pub fn state_with_content(content: MockContentRepository) -> AppState {
        state_with(content, MockTextGenerator::new(), MockTestBankRepository::new())
    }

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_sample_request_counts_add_up() {
        let request = sample_request();
        assert_eq!(request.requested_counts().per_type_sum(), request.num_total_qs);
    }

    #[test]
    fn test_sample_model_output_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(&sample_model_output()).unwrap();
        assert_eq!(value["questions"].as_array().map(Vec::len), Some(5));
    }
}
