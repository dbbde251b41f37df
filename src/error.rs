use std::collections::BTreeMap;
use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::event_sourcing::StoreError;

// ============================================================================
// Domain Error Taxonomy
// ============================================================================
//
// Every component surfaces failures as one of these kinds. Aggregate-level
// business rule errors (ConsignmentError, PickupError) convert into it.
//
// ============================================================================

/// Field name -> human readable problems with that field
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Internal => "internal",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    #[error("{entity} not found ({field} = {value})")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation { .. } => ErrorKind::Validation,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Forbidden(_) => ErrorKind::Forbidden,
            DomainError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Validation failure pinned to a single field
    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let problem = problem.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![problem.clone()]);
        DomainError::Validation {
            message: format!("Invalid {}: {}", field, problem),
            fields,
        }
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            DomainError::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        merge_validator_errors(&mut fields, &errors);
        validation_failed(fields)
    }
}

impl From<StoreError> for DomainError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::ConcurrencyConflict { aggregate_id, .. } => DomainError::Conflict(format!(
                "Record {} was modified concurrently, reload and retry",
                aggregate_id
            )),
            StoreError::AggregateNotFound(id) => DomainError::not_found("record", "id", id),
            other => {
                tracing::error!(error = %other, "Event store failure");
                DomainError::Internal(other.to_string())
            }
        }
    }
}

fn validation_failed(fields: FieldErrors) -> DomainError {
    let names: Vec<&str> = fields.keys().map(String::as_str).collect();
    DomainError::Validation {
        message: format!("Validation failed for: {}", names.join(", ")),
        fields,
    }
}

fn merge_validator_errors(fields: &mut FieldErrors, errors: &ValidationErrors) {
    for (field, problems) in errors.field_errors() {
        let entry = fields.entry(field.to_string()).or_default();
        for problem in problems.iter() {
            let text = problem
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| problem.code.to_string());
            entry.push(text);
        }
    }
}

/// Run derived validation on `input` and fold in checks the derive cannot
/// express (decimal ranges, cross-field rules).
pub fn validate_input<T: Validate>(input: &T, extra: FieldErrors) -> Result<(), DomainError> {
    let mut fields = extra;
    if let Err(errors) = input.validate() {
        merge_validator_errors(&mut fields, &errors);
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(validation_failed(fields))
    }
}
