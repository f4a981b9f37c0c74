//! Validation errors.

use std::fmt;
use thiserror::Error;

/// ValidationError is a single violation found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{path}: missing required field: {field}")]
    MissingField { path: String, field: String },

    #[error("{path}: type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("{path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("{path}: external reference remains: {reference}")]
    ExternalReference { path: String, reference: String },

    #[error("{path}: reference does not resolve: {reference}")]
    DanglingReference { path: String, reference: String },
}

impl ValidationError {
    pub fn missing_field(path: impl Into<String>, field: impl Into<String>) -> Self {
        ValidationError::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }

    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        ValidationError::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_value(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// ValidationErrors is a collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors { errors: Vec::new() }
    }

    /// Creates ValidationErrors from a single error.
    pub fn from_error(error: ValidationError) -> Self {
        ValidationErrors {
            errors: vec![error],
        }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Ok when empty, otherwise the collection itself as the error.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::type_mismatch(".components.schemas", "mapping", "sequence");
        assert_eq!(
            err.to_string(),
            ".components.schemas: type mismatch: expected mapping, got sequence"
        );
    }

    #[test]
    fn test_validation_errors_collection() {
        let mut errs = ValidationErrors::new();
        assert!(errs.is_empty());
        assert!(errs.clone().into_result().is_ok());

        errs.add(ValidationError::missing_field("", "info"));
        errs.add(ValidationError::missing_field("", "paths"));
        assert_eq!(errs.len(), 2);
        assert_eq!(errs.to_string(), ": missing required field: info\n: missing required field: paths");
        assert!(errs.into_result().is_err());
    }
}
