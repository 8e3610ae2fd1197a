// Binding limits and switches

use crate::model_state::DEFAULT_MAX_MODEL_ERRORS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingOptions {
    /// Largest collection a single binding may produce
    pub max_model_binding_collection_size: usize,
    pub max_model_errors: usize,
    /// Deepest object graph the validator walks
    pub max_validation_depth: usize,
    /// Bind an empty body to null instead of reporting an error
    pub allow_empty_body: bool,
    /// Bind empty input to null for nullable strings
    pub convert_empty_string_to_null: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            max_model_binding_collection_size: 1024,
            max_model_errors: DEFAULT_MAX_MODEL_ERRORS,
            max_validation_depth: 32,
            allow_empty_body: false,
            convert_empty_string_to_null: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BindingOptions::default();
        assert_eq!(options.max_model_binding_collection_size, 1024);
        assert_eq!(options.max_model_errors, 200);
        assert_eq!(options.max_validation_depth, 32);
        assert!(!options.allow_empty_body);
    }

    #[test]
    fn test_partial_deserialize() {
        let options: BindingOptions =
            serde_json::from_value(serde_json::json!({"allow_empty_body": true})).unwrap();
        assert!(options.allow_empty_body);
        assert_eq!(options.max_model_binding_collection_size, 1024);
    }
}
