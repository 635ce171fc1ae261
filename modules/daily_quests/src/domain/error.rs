use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("no active quests")]
    NoActiveQuests,

    #[error("Quest not found: {id}")]
    QuestNotFound { id: Uuid },

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("Assignment not found: {id}")]
    AssignmentNotFound { id: Uuid },

    #[error("Invalid recipient address: '{address}'")]
    InvalidRecipient { address: String },

    #[error("Email delivery failed: {message}")]
    Delivery { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn quest_not_found(id: Uuid) -> Self {
        Self::QuestNotFound { id }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        Self::UserNotFound { id }
    }

    pub fn assignment_not_found(id: Uuid) -> Self {
        Self::AssignmentNotFound { id }
    }

    pub fn invalid_recipient(address: impl Into<String>) -> Self {
        Self::InvalidRecipient {
            address: address.into(),
        }
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Errors that stop a batch job instead of being recorded per user.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}
