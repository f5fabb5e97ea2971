use crate::config::WorkflowPolicyConfig;
use crate::error::{ExpropiaError, ExpropiaResult};
use regex::Regex;
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> ExpropiaResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(ExpropiaError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.code {
                std::borrow::Cow::Borrowed("length") => {
                    format!("Length validation failed for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("range") => {
                    format!("Value out of range for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("required") => {
                    format!("Field '{}' is required", field)
                }
                _ => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    messages.join(", ")
}

/// A reason must be present on every transition request.
pub fn validate_reason_present(reason: &str) -> ExpropiaResult<()> {
    if reason.trim().is_empty() {
        return Err(ExpropiaError::validation("reason", "Reason is required"));
    }
    Ok(())
}

/// Backward transitions additionally hold the reason to a minimum length.
/// The threshold is policy, not invariant.
pub fn validate_reason(reason: &str, policy: &WorkflowPolicyConfig) -> ExpropiaResult<()> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ExpropiaError::validation("reason", "Reason is required"));
    }
    if trimmed.chars().count() < policy.min_reason_len {
        return Err(ExpropiaError::validation(
            "reason",
            format!(
                "Reason must be at least {} characters",
                policy.min_reason_len
            ),
        ));
    }
    Ok(())
}

/// Observations are mandatory on backward transitions as a friction control
/// against casual returns.
pub fn validate_observations(
    observations: Option<&str>,
    policy: &WorkflowPolicyConfig,
) -> ExpropiaResult<()> {
    let text = observations.map(str::trim).unwrap_or("");
    if text.is_empty() {
        return Err(ExpropiaError::validation(
            "observations",
            "Observations are required for backward transitions",
        ));
    }
    if text.chars().count() < policy.min_observations_len {
        return Err(ExpropiaError::validation(
            "observations",
            format!(
                "Observations must be at least {} characters",
                policy.min_observations_len
            ),
        ));
    }
    Ok(())
}

/// Stage codes are stable uppercase identifiers, e.g. `APPRAISAL`.
pub fn validate_stage_code(code: &str) -> ExpropiaResult<()> {
    let stage_code_regex = Regex::new(r"^[A-Z][A-Z0-9_]{1,49}$").unwrap();

    if !stage_code_regex.is_match(code) {
        return Err(ExpropiaError::validation(
            "stage_code",
            "Invalid stage code format. Expected uppercase identifier, e.g. APPRAISAL",
        ));
    }

    Ok(())
}

pub fn validate_uuid(uuid_str: &str) -> ExpropiaResult<uuid::Uuid> {
    uuid::Uuid::parse_str(uuid_str)
        .map_err(|_| ExpropiaError::validation("uuid", "Invalid UUID format"))
}
