// Validation errors

use thiserror::Error;

/// Validation error for a single field
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Model-state key of the field that failed validation
    pub field: String,

    /// Formatted error message
    pub message: String,

    /// Name of the attribute that failed, e.g. `required`
    pub constraint: String,

    /// Value that failed validation (optional)
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            constraint: "custom".to_string(),
            value: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Collection of validation errors
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("{} validation error(s)", errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Get errors for a specific field
    pub fn get_field_errors(&self, field: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// Problem-details style JSON grouping messages by field
    pub fn to_json(&self) -> serde_json::Value {
        let mut grouped = serde_json::Map::new();
        for error in &self.errors {
            let entry = grouped
                .entry(error.field.clone())
                .or_insert_with(|| serde_json::Value::Array(Vec::new()));
            if let serde_json::Value::Array(messages) = entry {
                messages.push(serde_json::Value::String(error.message.clone()));
            }
        }
        serde_json::json!({ "errors": grouped })
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::new("Name", "The Name field is required.");
        assert_eq!(err.to_string(), "Name: The Name field is required.");
    }

    #[test]
    fn test_errors_grouped_by_field() {
        let errors = ValidationErrors::new(vec![
            ValidationError::new("Name", "a"),
            ValidationError::new("Name", "b"),
            ValidationError::new("Age", "c"),
        ]);

        assert_eq!(errors.get_field_errors("Name").len(), 2);
        let json = errors.to_json();
        assert_eq!(json["errors"]["Name"], serde_json::json!(["a", "b"]));
        assert_eq!(json["errors"]["Age"], serde_json::json!(["c"]));
    }
}
