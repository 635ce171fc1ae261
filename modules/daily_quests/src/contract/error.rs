use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone)]
pub enum DailyQuestsError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error")]
    Internal,
}

impl DailyQuestsError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for DailyQuestsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            QuestNotFound { id } => Self::not_found(format!("quest {id}")),
            UserNotFound { id } => Self::not_found(format!("user {id}")),
            AssignmentNotFound { id } => Self::not_found(format!("assignment {id}")),
            NoActiveQuests => Self::not_found("no active quests"),
            InvalidRecipient { address } => {
                Self::validation(format!("invalid recipient address '{address}'"))
            }
            Validation { field, message } => Self::validation(format!("{field}: {message}")),
            Configuration { message } => Self::configuration(message),
            Delivery { .. } | Database { .. } => Self::internal(),
        }
    }
}
