pub mod content_repository;
pub mod test_bank_repository;

pub use content_repository::{ChapterKey, ContentRepository, OpenSearchContentRepository};
pub use test_bank_repository::{FileTestBankRepository, TestBankRepository};
