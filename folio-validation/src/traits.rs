// Validation traits

use crate::ValidationError;
use serde_json::Value;
use std::fmt;

/// A declarative rule attached to a model property or parameter.
///
/// Values arrive as JSON because bound models are carried as
/// `serde_json::Value` until they are extracted into their Rust type.
pub trait ValidationAttribute: Send + Sync + fmt::Debug {
    /// Constraint name reported on failures, e.g. `required`
    fn name(&self) -> &'static str;

    fn is_valid(&self, value: &Value) -> bool;

    fn format_error_message(&self, display_name: &str) -> String;

    /// Run the rule, reporting failures under `key`
    fn validate(&self, value: &Value, key: &str, display_name: &str) -> Result<(), ValidationError> {
        if self.is_valid(value) {
            return Ok(());
        }
        let mut error = ValidationError::new(key, self.format_error_message(display_name))
            .with_constraint(self.name());
        if let Some(text) = scalar_text(value) {
            error = error.with_value(text);
        }
        Err(error)
    }
}

/// Trait for types that validate themselves outside of model binding
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

/// Text form of a scalar JSON value, `None` for null and containers
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
