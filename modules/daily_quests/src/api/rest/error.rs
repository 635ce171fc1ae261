use axum::http::StatusCode;

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> ProblemResponse {
    let problem = Problem::new(status, title, detail)
        .with_type(format!("https://errors.questline.app/{}", code))
        .with_code(code)
        .with_instance(instance);

    let problem = if let Some(id) = tracing::Span::current().id() {
        problem.with_trace_id(id.into_u64().to_string())
    } else {
        problem
    };

    ProblemResponse(problem)
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "QUESTS_USER_NOT_FOUND",
            "User not found",
            format!("User with id {} was not found", id),
            instance,
        ),
        DomainError::AssignmentNotFound { id } => from_parts(
            StatusCode::NOT_FOUND,
            "QUESTS_ASSIGNMENT_NOT_FOUND",
            "Assignment not found",
            format!("Assignment with id {} was not found", id),
            instance,
        ),
        DomainError::NoActiveQuests => from_parts(
            StatusCode::SERVICE_UNAVAILABLE,
            "QUESTS_CATALOG_EMPTY",
            "No active quests",
            "The daily quest catalog is empty",
            instance,
        ),
        DomainError::InvalidRecipient { .. } | DomainError::Validation { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "QUESTS_VALIDATION",
            "Validation error",
            format!("{}", e),
            instance,
        ),
        DomainError::Configuration { .. } => {
            tracing::error!(error = ?e, "Configuration error");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "QUESTS_CONFIGURATION",
                "Configuration error",
                "The service is not fully configured",
                instance,
            )
        }
        DomainError::QuestNotFound { .. } | DomainError::Delivery { .. } | DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Internal error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "QUESTS_INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    }
}
