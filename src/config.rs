use std::{collections::BTreeMap, env};

use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};

/// Books indexed in the content store when `TITLE_INDEX_MAP` is not set.
pub static DEFAULT_TITLE_INDEX: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "An Invitation to Health".to_string(),
            "chunk_357973585".to_string(),
        ),
        (
            "Steps to writing well".to_string(),
            "chunk_1337899796".to_string(),
        ),
    ])
});

#[derive(Clone, Debug)]
pub struct Config {
    pub web_server_host: String,
    pub web_server_port: u16,
    pub content_store_url: String,
    pub content_store_username: Option<String>,
    pub content_store_password: Option<SecretString>,
    pub content_store_timeout_secs: u64,
    pub title_index: BTreeMap<String, String>,
    pub llm_api_base: String,
    pub llm_api_key: SecretString,
    pub llm_model: String,
    pub llm_max_output_tokens: u32,
    pub llm_max_input_tokens: u32,
    pub default_max_chunks: u32,
    pub default_max_chars: usize,
    pub output_dir: String,
}

impl Config {
    /// Reads configuration from the process environment, after loading `.env` if present.
    pub fn from_env() -> AppResult<Self> {
        let _ = dotenvy::dotenv();

        let title_index = match env::var("TITLE_INDEX_MAP") {
            Ok(raw) => parse_title_index(&raw)?,
            Err(_) => DEFAULT_TITLE_INDEX.clone(),
        };

        Ok(Self {
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: parse_or("WEB_SERVER_PORT", 8000),
            content_store_url: env::var("CONTENT_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:9200".to_string()),
            content_store_username: env::var("CONTENT_STORE_USERNAME").ok(),
            content_store_password: env::var("CONTENT_STORE_PASSWORD")
                .ok()
                .map(SecretString::from),
            content_store_timeout_secs: parse_or("CONTENT_STORE_TIMEOUT_SECS", 60),
            title_index,
            llm_api_base: env::var("LLM_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_api_key: SecretString::from(env::var("LLM_API_KEY").unwrap_or_default()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            llm_max_output_tokens: parse_or("LLM_MAX_OUTPUT_TOKENS", 30_000),
            llm_max_input_tokens: parse_or("LLM_MAX_INPUT_TOKENS", 32_000),
            default_max_chunks: parse_or("DEFAULT_MAX_CHUNKS", 200),
            default_max_chars: parse_or("DEFAULT_MAX_CHARS", 100_000),
            output_dir: env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "generated_test_banks".to_string()),
        })
    }

    /// Rejects settings the service cannot start with.
    pub fn validate(&self) -> AppResult<()> {
        if self.web_server_port == 0 {
            return Err(AppError::InternalError(
                "WEB_SERVER_PORT must be a non-zero port".to_string(),
            ));
        }

        if self.title_index.is_empty() {
            return Err(AppError::InternalError(
                "title index map must contain at least one book".to_string(),
            ));
        }

        if self.llm_max_output_tokens == 0 || self.llm_max_input_tokens == 0 {
            return Err(AppError::InternalError(
                "LLM token budgets must be greater than zero".to_string(),
            ));
        }

        if self.llm_api_key.expose_secret().trim().is_empty() {
            return Err(AppError::InternalError(
                "LLM_API_KEY is not set".to_string(),
            ));
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8000,
            content_store_url: "http://localhost:9200".to_string(),
            content_store_username: None,
            content_store_password: None,
            content_store_timeout_secs: 5,
            title_index: DEFAULT_TITLE_INDEX.clone(),
            llm_api_base: "http://localhost:4000/v1".to_string(),
            llm_api_key: SecretString::from("test_api_key".to_string()),
            llm_model: "test-model".to_string(),
            llm_max_output_tokens: 4_000,
            llm_max_input_tokens: 8_000,
            default_max_chunks: 50,
            default_max_chars: 20_000,
            output_dir: env::temp_dir()
                .join("testgen-server-tests")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a `{"Book title": "index-id", ...}` JSON object.
pub fn parse_title_index(raw: &str) -> AppResult<BTreeMap<String, String>> {
    let map: BTreeMap<String, String> = serde_json::from_str(raw).map_err(|e| {
        AppError::InternalError(format!("TITLE_INDEX_MAP is not a JSON object of strings: {}", e))
    })?;

    if let Some((title, _)) = map
        .iter()
        .find(|(title, index)| title.trim().is_empty() || index.trim().is_empty())
    {
        return Err(AppError::InternalError(format!(
            "TITLE_INDEX_MAP has an empty title or index near '{}'",
            title
        )));
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_config_is_valid() {
        let config = Config::test_config();

        assert!(config.validate().is_ok());
        assert_eq!(
            config.title_index.get("An Invitation to Health").map(String::as_str),
            Some("chunk_357973585")
        );
    }

    #[test]
    fn test_validate_rejects_missing_api_key() {
        let mut config = Config::test_config();
        config.llm_api_key = SecretString::from(String::new());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::test_config();
        config.llm_max_input_tokens = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_title_index() {
        let map = parse_title_index(r#"{"Biology 101": "chunk_1", "Chemistry": "chunk_2"}"#)
            .expect("valid map should parse");

        assert_eq!(map.len(), 2);
        assert_eq!(map["Chemistry"], "chunk_2");
    }

    #[test]
    fn test_parse_title_index_rejects_bad_input() {
        assert!(parse_title_index("[1, 2]").is_err());
        assert!(parse_title_index(r#"{"Biology": ""}"#).is_err());
    }
}
