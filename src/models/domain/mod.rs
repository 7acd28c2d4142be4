pub mod passage;
pub mod question;
pub mod test_bank;
pub use passage::{ChapterSummary, ContentPassage, RetrievedChapter};
pub use question::{Question, QuestionCounts, QuestionKind, QuestionOption, QuestionType};
pub use test_bank::TestBank;
