//! Object validation
//!
//! After binding, the validator walks the bound value alongside its
//! metadata, evaluating validation attributes at each node and recording
//! the outcome in model state under the same keys binding used.

use crate::metadata::{MetadataProvider, ModelKind, ModelMetadata};
use crate::model_state::{ModelStateDictionary, ModelValidationState};
use crate::names::{create_index_model_name, create_property_model_name};
use folio_core::Error;
use folio_core::logging::trace;
use folio_validation::ValidationAttribute;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// How the children of a bound container are keyed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStrategy {
    /// Elements were bound from `name.index`; element keys use these indexes
    ExplicitIndex(Vec<String>),
    /// Dictionary bound from `name[key]`: (entry model name, dictionary key)
    ShortFormDictionary(Vec<(String, String)>),
}

/// Strategies recorded during binding, keyed by model name
#[derive(Debug, Clone, Default)]
pub struct ValidationStateDictionary {
    entries: HashMap<String, ValidationStrategy>,
}

impl ValidationStateDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, strategy: ValidationStrategy) {
        self.entries.insert(key.to_ascii_lowercase(), strategy);
    }

    pub fn get(&self, key: &str) -> Option<&ValidationStrategy> {
        self.entries.get(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validation attributes and display name attached to one node
#[derive(Clone, Copy)]
pub struct NodeRules<'r> {
    pub validators: &'r [Arc<dyn ValidationAttribute>],
    pub display_name: &'r str,
}

impl<'r> NodeRules<'r> {
    pub fn none(display_name: &'r str) -> Self {
        Self {
            validators: &[],
            display_name,
        }
    }
}

/// Walks a bound model and records validation results in model state
pub struct ObjectValidator<'a> {
    metadata: &'a MetadataProvider,
    validation_state: &'a ValidationStateDictionary,
    model_state: &'a mut ModelStateDictionary,
    max_depth: usize,
}

impl<'a> ObjectValidator<'a> {
    pub fn new(
        metadata: &'a MetadataProvider,
        validation_state: &'a ValidationStateDictionary,
        model_state: &'a mut ModelStateDictionary,
        max_depth: usize,
    ) -> Self {
        Self {
            metadata,
            validation_state,
            model_state,
            max_depth,
        }
    }

    /// Validate `model` bound under `key`. Returns whether the field is valid.
    pub fn validate(
        &mut self,
        metadata: &Arc<ModelMetadata>,
        rules: NodeRules<'_>,
        key: &str,
        model: &Value,
    ) -> Result<bool, Error> {
        trace!(key, model_type = %metadata.type_name, "Validating model");
        self.visit(metadata, rules, key, model, 0)
    }

    fn visit(
        &mut self,
        metadata: &Arc<ModelMetadata>,
        rules: NodeRules<'_>,
        key: &str,
        model: &Value,
        depth: usize,
    ) -> Result<bool, Error> {
        if depth > self.max_depth {
            return Err(Error::InvalidOperation(format!(
                "Validation exceeded the maximum configured depth '{}' when validating type '{}'.",
                self.max_depth, metadata.type_name
            )));
        }

        match &metadata.kind {
            ModelKind::Complex(complex) if !model.is_null() => {
                for property in &complex.properties {
                    let child_key = create_property_model_name(key, property.field_name());
                    if property.validate_never {
                        self.model_state.suppress_validation(&child_key);
                        continue;
                    }
                    let child_metadata = self.metadata.get(&property.model_type);
                    let child = model.get(&property.name).unwrap_or(&Value::Null);
                    let child_rules = NodeRules {
                        validators: &property.binding_info.validators,
                        display_name: property.display(),
                    };
                    self.visit(&child_metadata, child_rules, &child_key, child, depth + 1)?;
                }
            }
            ModelKind::Array(element) | ModelKind::Collection { element, .. } => {
                if let Value::Array(items) = model {
                    let element = self.metadata.get(element);
                    let indexes = match self.validation_state.get(key) {
                        Some(ValidationStrategy::ExplicitIndex(indexes)) => indexes.clone(),
                        _ => (0..items.len()).map(|i| i.to_string()).collect(),
                    };
                    for (item, index) in items.iter().zip(indexes.iter()) {
                        let item_key = create_index_model_name(key, index);
                        let item_rules = NodeRules::none(&element.type_name);
                        self.visit(&element, item_rules, &item_key, item, depth + 1)?;
                    }
                }
            }
            ModelKind::Dictionary { key: key_type, value } => {
                if let Value::Object(entries) = model {
                    let value_metadata = self.metadata.get(value);
                    match self.validation_state.get(key).cloned() {
                        Some(ValidationStrategy::ShortFormDictionary(mappings)) => {
                            for (entry_key, dictionary_key) in mappings {
                                let entry = entries.get(&dictionary_key).unwrap_or(&Value::Null);
                                let entry_rules = NodeRules::none(&value_metadata.type_name);
                                self.visit(&value_metadata, entry_rules, &entry_key, entry, depth + 1)?;
                            }
                        }
                        _ => {
                            let key_metadata = self.metadata.get(key_type);
                            for (i, (dictionary_key, entry)) in entries.iter().enumerate() {
                                let pair_key = create_index_model_name(key, &i.to_string());
                                let key_value = Value::String(dictionary_key.clone());
                                self.visit(
                                    &key_metadata,
                                    NodeRules::none(&key_metadata.type_name),
                                    &create_property_model_name(&pair_key, "Key"),
                                    &key_value,
                                    depth + 1,
                                )?;
                                self.visit(
                                    &value_metadata,
                                    NodeRules::none(&value_metadata.type_name),
                                    &create_property_model_name(&pair_key, "Value"),
                                    entry,
                                    depth + 1,
                                )?;
                            }
                        }
                    }
                }
            }
            ModelKind::KeyValuePair { key: key_type, value } if !model.is_null() => {
                for (name, side) in [("Key", key_type), ("Value", value)] {
                    let side_metadata = self.metadata.get(side);
                    let side_value = model.get(name).unwrap_or(&Value::Null);
                    self.visit(
                        &side_metadata,
                        NodeRules::none(&side_metadata.type_name),
                        &create_property_model_name(key, name),
                        side_value,
                        depth + 1,
                    )?;
                }
            }
            _ => {}
        }

        self.validate_node(metadata, rules, key, model)
    }

    fn validate_node(
        &mut self,
        metadata: &ModelMetadata,
        rules: NodeRules<'_>,
        key: &str,
        model: &Value,
    ) -> Result<bool, Error> {
        if self.model_state.get_validation_state(key) != ModelValidationState::Invalid {
            let validators = rules.validators.iter().chain(metadata.validators.iter());
            for validator in validators {
                if let Err(error) = validator.validate(model, key, rules.display_name) {
                    self.model_state.try_add_model_error(key, error.message);
                }
            }
        }

        if self.model_state.get_field_validation_state(key) == ModelValidationState::Invalid {
            return Ok(false);
        }
        if self.model_state.contains_key(key) {
            self.model_state.mark_field_valid(key)?;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Bindable, PropertyMetadata};
    use folio_validation::{Range, Required};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Default, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Item {
        name: Option<String>,
        quantity: i32,
    }

    impl Bindable for Item {
        fn describe() -> ModelMetadata {
            ModelMetadata::complex::<Item>(
                "Item",
                vec![
                    PropertyMetadata::new::<Option<String>>("Name").required(),
                    PropertyMetadata::new::<i32>("Quantity").validate(Range::new(1.0, 10.0)),
                ],
            )
        }
    }

    fn validate(model: &Value, key: &str, state: &mut ModelStateDictionary) -> bool {
        let provider = MetadataProvider::new();
        let metadata = provider.get_for::<Item>();
        let strategies = ValidationStateDictionary::new();
        let mut validator = ObjectValidator::new(&provider, &strategies, state, 32);
        validator
            .validate(&metadata, NodeRules::none("Item"), key, model)
            .unwrap()
    }

    #[test]
    fn test_rules_report_under_property_keys() {
        let mut state = ModelStateDictionary::new();
        state.set_model_value("item.Quantity", Some(json!("20")), Some("20".into()));

        let valid = validate(&json!({"Name": null, "Quantity": 20}), "item", &mut state);

        assert!(!valid);
        assert_eq!(
            state.get("item.Name").unwrap().errors[0].error_message,
            "The Name field is required."
        );
        assert_eq!(
            state.get("item.Quantity").unwrap().errors[0].error_message,
            "The field Quantity must be between 1 and 10."
        );
    }

    #[test]
    fn test_valid_entries_are_marked() {
        let mut state = ModelStateDictionary::new();
        state.set_model_value("Name", Some(json!("bill")), Some("bill".into()));

        assert!(validate(&json!({"Name": "bill", "Quantity": 2}), "", &mut state));
        assert_eq!(state.get_validation_state("Name"), ModelValidationState::Valid);
        // No entry is created for values that were never bound
        assert!(!state.contains_key("Quantity"));
    }

    #[test]
    fn test_invalid_entries_skip_rules() {
        let mut state = ModelStateDictionary::new();
        state.add_model_error("Quantity", "The value 'x' is not valid for Int32.");

        validate(&json!({"Name": "a", "Quantity": 0}), "", &mut state);
        assert_eq!(state.get("Quantity").unwrap().errors.len(), 1);
    }

    #[test]
    fn test_max_depth() {
        let provider = MetadataProvider::new();
        let metadata = provider.get_for::<Item>();
        let strategies = ValidationStateDictionary::new();
        let mut state = ModelStateDictionary::new();
        let mut validator = ObjectValidator::new(&provider, &strategies, &mut state, 0);

        let result = validator.validate(&metadata, NodeRules::none("Item"), "", &json!({"Name": "a"}));
        assert!(matches!(result, Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_explicit_indexes_key_elements() {
        let provider = MetadataProvider::new();
        let metadata = provider.get_for::<Vec<Item>>();
        let mut strategies = ValidationStateDictionary::new();
        strategies.insert(
            "items",
            ValidationStrategy::ExplicitIndex(vec!["a".into(), "b".into()]),
        );
        let mut state = ModelStateDictionary::new();
        let mut validator = ObjectValidator::new(&provider, &strategies, &mut state, 32);

        let model = json!([{"Name": "x", "Quantity": 1}, {"Name": null, "Quantity": 1}]);
        let valid = validator
            .validate(&metadata, NodeRules::none("items"), "items", &model)
            .unwrap();

        assert!(!valid);
        assert!(state.contains_key("items[b].Name"));
        assert!(!state.contains_key("items[1].Name"));
    }

    #[test]
    fn test_required_rule_on_root() {
        let provider = MetadataProvider::new();
        let metadata = provider.get_for::<Option<String>>();
        let strategies = ValidationStateDictionary::new();
        let mut state = ModelStateDictionary::new();
        let validators: Vec<Arc<dyn ValidationAttribute>> = vec![Arc::new(Required::new())];
        let mut validator = ObjectValidator::new(&provider, &strategies, &mut state, 32);

        let rules = NodeRules {
            validators: &validators,
            display_name: "name",
        };
        assert!(!validator.validate(&metadata, rules, "name", &Value::Null).unwrap());
        assert_eq!(
            state.get("name").unwrap().errors[0].error_message,
            "The name field is required."
        );
    }
}
