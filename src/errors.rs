use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use async_openai::error::OpenAIError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        available: Vec<String>,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
            available: Vec::new(),
        }
    }

    /// Not-found error that tells the caller which values would have worked.
    pub fn not_found_with(message: impl Into<String>, available: Vec<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
            available,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            AppError::GenerationError(_) => "GENERATION_ERROR",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<Vec<String>>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GenerationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let available = match self {
            AppError::NotFound { available, .. } if !available.is_empty() => {
                Some(available.clone())
            }
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            code: self.status_code().as_u16(),
            kind: self.error_code(),
            available,
        })
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(format!("content store request failed: {}", err))
    }
}

impl From<OpenAIError> for AppError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::InvalidArgument(msg) => {
                AppError::InternalError(format!("invalid model request: {}", msg))
            }
            other => AppError::Upstream(format!("model service request failed: {}", other)),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
