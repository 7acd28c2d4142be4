use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    repositories::{
        ContentRepository, FileTestBankRepository, OpenSearchContentRepository,
        TestBankRepository,
    },
    services::{
        generation_service::{OpenAiGenerator, TextGenerator},
        test_bank_service::TestBankService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub test_bank_service: Arc<TestBankService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let content_repository = Arc::new(OpenSearchContentRepository::new(&config)?);
        let generator = Arc::new(OpenAiGenerator::new(&config));
        let test_bank_repository = Arc::new(FileTestBankRepository::new(&config.output_dir));

        Ok(Self::with_backends(
            config,
            content_repository,
            generator,
            test_bank_repository,
        ))
    }

    /// Builds the state around caller-supplied backends.
    pub fn with_backends(
        config: Config,
        content_repository: Arc<dyn ContentRepository>,
        generator: Arc<dyn TextGenerator>,
        test_bank_repository: Arc<dyn TestBankRepository>,
    ) -> Self {
        let test_bank_service = Arc::new(TestBankService::new(
            &config,
            content_repository,
            generator,
            test_bank_repository,
        ));

        Self {
            test_bank_service,
            config: Arc::new(config),
        }
    }
}
