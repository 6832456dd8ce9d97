//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("llm error: {0}")]
    Llm(String),

    #[error("server error: {0}")]
    Server(String),
}

impl From<crate::llm::ProviderError> for AppError {
    fn from(e: crate::llm::ProviderError) -> Self {
        AppError::Llm(e.to_string())
    }
}
