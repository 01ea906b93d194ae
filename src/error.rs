//! Error types shared by the interpreter, the task service and the bot adapter.

use crate::types::TaskId;
use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Recovered locally into a user-visible reply
    TaskNotFound,
    MalformedCompletion,
    InvalidFieldValue,

    // Collaborator failures
    CompletionFailed,
    DatabaseError,
    ConfigError,
}

/// Errors raised while handling a chat message.
#[derive(Debug, Error)]
pub enum BotError {
    /// The target task does not exist or belongs to another user.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The text-completion output does not follow the action contract.
    #[error("Malformed completion: {0}")]
    MalformedCompletion(String),

    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The text-completion call itself failed.
    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl BotError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BotError::NotFound(_) => ErrorCode::TaskNotFound,
            BotError::MalformedCompletion(_) => ErrorCode::MalformedCompletion,
            BotError::Validation { .. } => ErrorCode::InvalidFieldValue,
            BotError::Completion(_) => ErrorCode::CompletionFailed,
            BotError::Database(_) => ErrorCode::DatabaseError,
            BotError::Config(_) => ErrorCode::ConfigError,
        }
    }

    // Convenience constructors

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        BotError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        BotError::MalformedCompletion(reason.into())
    }

    pub fn completion(err: impl std::fmt::Display) -> Self {
        BotError::Completion(err.to_string())
    }

    pub fn config(err: impl std::fmt::Display) -> Self {
        BotError::Config(err.to_string())
    }
}

// Store operations return anyhow; recover our own variants by downcasting
impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BotError>() {
            Ok(bot_err) => bot_err,
            Err(err) => BotError::Database(format!("{:#}", err)),
        }
    }
}

/// Result type for message handling.
pub type BotResult<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_wrapped_bot_error_is_recovered() {
        let err: anyhow::Error = BotError::validation("description", "must not be empty").into();
        let recovered = BotError::from(err);
        assert_eq!(recovered.code(), ErrorCode::InvalidFieldValue);
        assert_eq!(
            recovered.to_string(),
            "Invalid description: must not be empty"
        );
    }

    #[test]
    fn foreign_anyhow_error_becomes_database_error() {
        let recovered = BotError::from(anyhow::anyhow!("disk I/O error"));
        assert_eq!(recovered.code(), ErrorCode::DatabaseError);
        assert!(recovered.to_string().contains("disk I/O error"));
    }

    #[test]
    fn error_code_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::MalformedCompletion).unwrap();
        assert_eq!(json, "\"MALFORMED_COMPLETION\"");
    }
}
