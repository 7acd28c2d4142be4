use serde::{Deserialize, Serialize};

use crate::models::domain::{ChapterSummary, Question, QuestionCounts};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDto {
    pub title: String,
    pub index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaptersResponse {
    pub title: String,
    pub index_used: String,
    pub chapters: Vec<ChapterSummary>,
    pub total_chapters: usize,
    pub chapter_key_used: String,
}

/// A question the parser rejected, with its position in the model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedQuestion {
    pub position: usize,
    pub reason: String,
}

/// How the generated batch compares with what was asked for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationReport {
    pub requested: QuestionCounts,
    pub extracted: QuestionCounts,
    pub dropped: Vec<DroppedQuestion>,
    pub surplus_discarded: usize,
    pub count_mismatch: bool,
    pub output_truncated: bool,
    pub content_truncated: bool,
    pub passages_retrieved: usize,
    pub passages_used: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTestBankResponse {
    pub title: String,
    pub chapter: String,
    pub questions: Vec<Question>,
    pub index_used: String,
    pub file_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,
    pub report: GenerationReport,
}
