use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ExpropiaError {
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Sequence violation: {message}")]
    SequenceViolation { message: String },

    #[error("Checklist incomplete for stage {stage_code}: {pending} required item(s) pending")]
    ChecklistIncomplete { stage_code: String, pending: usize },

    #[error("Invalid case status: expected {expected}, found {found}")]
    InvalidCaseStatus { expected: String, found: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Concurrency conflict: {message}")]
    ConcurrencyConflict { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ExpropiaError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn sequence_violation(message: impl Into<String>) -> Self {
        Self::SequenceViolation {
            message: message.into(),
        }
    }

    pub fn checklist_incomplete(stage_code: impl Into<String>, pending: usize) -> Self {
        Self::ChecklistIncomplete {
            stage_code: stage_code.into(),
            pending,
        }
    }

    pub fn invalid_case_status(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::InvalidCaseStatus {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn concurrency_conflict(message: impl Into<String>) -> Self {
        Self::ConcurrencyConflict {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::SequenceViolation { .. } => "SEQUENCE_VIOLATION",
            Self::ChecklistIncomplete { .. } => "CHECKLIST_INCOMPLETE",
            Self::InvalidCaseStatus { .. } => "INVALID_CASE_STATUS",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::SequenceViolation { .. } => 422,
            Self::ChecklistIncomplete { .. } => 422,
            Self::InvalidCaseStatus { .. } => 409,
            Self::NotFound { .. } => 404,
            Self::ConcurrencyConflict { .. } => 409,
            Self::Configuration { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

pub type ExpropiaResult<T> = Result<T, ExpropiaError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl From<ExpropiaError> for ErrorResponse {
    fn from(error: ExpropiaError) -> Self {
        Self {
            error: error.to_string(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

impl From<serde_json::Error> for ExpropiaError {
    fn from(error: serde_json::Error) -> Self {
        Self::validation("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for ExpropiaError {
    fn from(error: config::ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            ExpropiaError::validation("reason", "too short").error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            ExpropiaError::sequence_violation("not adjacent").error_code(),
            "SEQUENCE_VIOLATION"
        );
        assert_eq!(
            ExpropiaError::checklist_incomplete("LEGAL", 2).error_code(),
            "CHECKLIST_INCOMPLETE"
        );
        assert_eq!(
            ExpropiaError::invalid_case_status("active", "completed").error_code(),
            "INVALID_CASE_STATUS"
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ExpropiaError::validation("f", "m").http_status_code(), 400);
        assert_eq!(ExpropiaError::not_found("case").http_status_code(), 404);
        assert_eq!(
            ExpropiaError::invalid_case_status("active", "cancelled").http_status_code(),
            409
        );
        assert_eq!(
            ExpropiaError::checklist_incomplete("LEGAL", 1).http_status_code(),
            422
        );
    }

    #[test]
    fn test_error_response_conversion() {
        let response: ErrorResponse = ExpropiaError::not_found("stage REVIEW").into();
        assert_eq!(response.code, "NOT_FOUND");
        assert!(response.message.contains("stage REVIEW"));
    }
}
