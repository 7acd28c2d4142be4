use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::question::Question;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestBank {
    pub title: String,
    pub chapter: String,
    pub index_used: String,
    pub generated_at: DateTime<Utc>,
    pub questions: Vec<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_file: Option<String>, // set after a successful save
}

impl TestBank {
    pub fn new(title: &str, chapter: &str, index_used: &str, questions: Vec<Question>) -> Self {
        TestBank {
            title: title.to_string(),
            chapter: chapter.to_string(),
            index_used: index_used.to_string(),
            generated_at: Utc::now(),
            questions,
            saved_file: None,
        }
    }
}
