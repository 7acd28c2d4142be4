pub mod content_service;
pub mod generation_service;
pub mod index_resolver;
pub mod prompt_builder;
pub mod response_parser;
pub mod test_bank_service;
