use serde::{Deserialize, Serialize};

/// One chunk of chapter text as stored in the content index.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContentPassage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_sequence: Option<i64>,
}

/// Passages of a chapter in reading order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievedChapter {
    pub chapter: String,
    pub total_hits: u64,
    pub passages: Vec<ContentPassage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChapterSummary {
    pub name: String,
    pub doc_count: u64,
}
