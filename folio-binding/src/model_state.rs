//! Model state
//!
//! Records what was attempted for every bound key, the errors found while
//! binding and validating, and the validation state of each entry. Keys
//! compare ignoring ASCII case; an entry remembers the key it was first
//! created with.

use crate::names::key_matches_prefix;
use folio_core::Error;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

/// Default cap on recorded errors
pub const DEFAULT_MAX_MODEL_ERRORS: usize = 200;

pub const TOO_MANY_ERRORS_MESSAGE: &str =
    "The maximum number of allowed model errors has been reached.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ModelValidationState {
    Unvalidated,
    Invalid,
    Valid,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelError {
    pub error_message: String,
    /// Description of the failure that caused the error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            exception: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStateEntry {
    pub key: String,
    /// The string or string array read from the request
    pub raw_value: Option<Value>,
    /// Comma-joined text of the raw values
    pub attempted_value: Option<String>,
    pub errors: Vec<ModelError>,
    pub validation_state: ModelValidationState,
}

impl ModelStateEntry {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            raw_value: None,
            attempted_value: None,
            errors: Vec::new(),
            validation_state: ModelValidationState::Unvalidated,
        }
    }
}

/// Binding and validation results keyed by model name
#[derive(Debug, Clone)]
pub struct ModelStateDictionary {
    entries: IndexMap<String, ModelStateEntry>,
    max_allowed_errors: usize,
    error_count: usize,
    has_recorded_max_model_error: bool,
}

impl Default for ModelStateDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStateDictionary {
    pub fn new() -> Self {
        Self::with_max_errors(DEFAULT_MAX_MODEL_ERRORS)
    }

    pub fn with_max_errors(max_allowed_errors: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_allowed_errors,
            error_count: 0,
            has_recorded_max_model_error: false,
        }
    }

    pub fn max_allowed_errors(&self) -> usize {
        self.max_allowed_errors
    }

    pub fn set_max_allowed_errors(&mut self, max: usize) {
        self.max_allowed_errors = max;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_reached_max_errors(&self) -> bool {
        self.error_count >= self.max_allowed_errors
    }

    /// True when no entry is invalid
    pub fn is_valid(&self) -> bool {
        self.validation_state() != ModelValidationState::Invalid
    }

    /// Aggregate state of every entry
    pub fn validation_state(&self) -> ModelValidationState {
        self.get_field_validation_state("")
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelStateEntry)> {
        self.entries.values().map(|e| (e.key.as_str(), e))
    }

    pub fn get(&self, key: &str) -> Option<&ModelStateEntry> {
        self.entries.get(&key.to_ascii_lowercase())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ModelStateEntry> {
        self.entries.get_mut(&key.to_ascii_lowercase())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_ascii_lowercase())
    }

    fn get_or_add(&mut self, key: &str) -> &mut ModelStateEntry {
        self.entries
            .entry(key.to_ascii_lowercase())
            .or_insert_with(|| ModelStateEntry::new(key))
    }

    /// Record the raw and attempted value read for `key`
    pub fn set_model_value(&mut self, key: &str, raw_value: Option<Value>, attempted_value: Option<String>) {
        let entry = self.get_or_add(key);
        entry.raw_value = raw_value;
        entry.attempted_value = attempted_value;
    }

    /// Add an error unless the error cap was reached.
    ///
    /// Reaching the cap records one final error under the empty key.
    pub fn try_add_model_error(&mut self, key: &str, message: impl Into<String>) -> bool {
        self.try_add(key, ModelError::new(message))
    }

    pub fn add_model_error(&mut self, key: &str, message: impl Into<String>) {
        self.try_add_model_error(key, message);
    }

    /// Add an error caused by an underlying failure
    pub fn try_add_model_exception(
        &mut self,
        key: &str,
        message: impl Into<String>,
        exception: impl Into<String>,
    ) -> bool {
        self.try_add(
            key,
            ModelError {
                error_message: message.into(),
                exception: Some(exception.into()),
            },
        )
    }

    fn try_add(&mut self, key: &str, error: ModelError) -> bool {
        if self.error_count >= self.max_allowed_errors {
            return false;
        }

        if self.error_count + 1 == self.max_allowed_errors {
            if !self.has_recorded_max_model_error {
                self.push_error("", ModelError::new(TOO_MANY_ERRORS_MESSAGE));
                self.has_recorded_max_model_error = true;
            }
            return false;
        }

        self.push_error(key, error);
        true
    }

    fn push_error(&mut self, key: &str, error: ModelError) {
        self.error_count += 1;
        let entry = self.get_or_add(key);
        entry.errors.push(error);
        entry.validation_state = ModelValidationState::Invalid;
    }

    /// State of the entry under exactly `key`
    pub fn get_validation_state(&self, key: &str) -> ModelValidationState {
        self.get(key)
            .map(|e| e.validation_state)
            .unwrap_or(ModelValidationState::Unvalidated)
    }

    /// Aggregate state of `key` and everything below it.
    ///
    /// Any invalid entry makes the field invalid; otherwise any unvalidated
    /// entry leaves it unvalidated. A field whose entries were all skipped is
    /// skipped, and a field with no entries is unvalidated.
    pub fn get_field_validation_state(&self, key: &str) -> ModelValidationState {
        let mut found = false;
        let mut unvalidated = false;
        let mut all_skipped = true;

        for entry in self.entries_with_prefix(key) {
            found = true;
            match entry.validation_state {
                ModelValidationState::Invalid => return ModelValidationState::Invalid,
                ModelValidationState::Unvalidated => unvalidated = true,
                ModelValidationState::Valid => all_skipped = false,
                ModelValidationState::Skipped => {}
            }
        }

        if !found || unvalidated {
            ModelValidationState::Unvalidated
        } else if all_skipped {
            ModelValidationState::Skipped
        } else {
            ModelValidationState::Valid
        }
    }

    /// Mark `key` valid. Fails if the entry is already invalid.
    pub fn mark_field_valid(&mut self, key: &str) -> Result<(), Error> {
        self.transition(key, ModelValidationState::Valid)
    }

    /// Mark `key` skipped. Fails if the entry is already invalid.
    pub fn mark_field_skipped(&mut self, key: &str) -> Result<(), Error> {
        self.transition(key, ModelValidationState::Skipped)
    }

    fn transition(&mut self, key: &str, state: ModelValidationState) -> Result<(), Error> {
        let entry = self.get_or_add(key);
        if entry.validation_state == ModelValidationState::Invalid {
            return Err(Error::InvalidOperation(format!(
                "A field previously marked invalid should not be marked {}.",
                match state {
                    ModelValidationState::Skipped => "skipped",
                    _ => "valid",
                }
            )));
        }
        entry.validation_state = state;
        Ok(())
    }

    /// Mark everything at or below `key` skipped, leaving invalid entries alone
    pub fn suppress_validation(&mut self, key: &str) {
        for entry in self.entries.values_mut() {
            if key_matches_prefix(&entry.key, key)
                && entry.validation_state != ModelValidationState::Invalid
            {
                entry.validation_state = ModelValidationState::Skipped;
            }
        }
    }

    /// Drop errors at or below `key` and reset those entries to unvalidated
    pub fn clear_validation_state(&mut self, key: &str) {
        let mut removed = 0;
        for entry in self.entries.values_mut() {
            if key_matches_prefix(&entry.key, key) {
                removed += entry.errors.len();
                entry.errors.clear();
                entry.validation_state = ModelValidationState::Unvalidated;
            }
        }
        self.error_count = self.error_count.saturating_sub(removed);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.shift_remove(&key.to_ascii_lowercase()) {
            Some(entry) => {
                self.error_count = self.error_count.saturating_sub(entry.errors.len());
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.error_count = 0;
        self.has_recorded_max_model_error = false;
    }

    /// Copy every entry of `other` into this dictionary, replacing same-named ones
    pub fn merge(&mut self, other: &ModelStateDictionary) {
        for entry in other.entries.values() {
            if let Some(previous) = self
                .entries
                .insert(entry.key.to_ascii_lowercase(), entry.clone())
            {
                self.error_count = self.error_count.saturating_sub(previous.errors.len());
            }
            self.error_count += entry.errors.len();
        }
    }

    /// Entries at or below `prefix`
    pub fn entries_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a ModelStateEntry> + 'a {
        self.entries
            .values()
            .filter(move |e| key_matches_prefix(&e.key, prefix))
    }

    pub fn find_keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries_with_prefix(prefix).map(|e| e.key.as_str())
    }

    /// Error messages grouped by key, for error responses
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for entry in self.entries.values().filter(|e| !e.errors.is_empty()) {
            let messages = entry
                .errors
                .iter()
                .map(|e| Value::String(e.error_message.clone()))
                .collect();
            map.insert(entry.key.clone(), Value::Array(messages));
        }
        Value::Object(map)
    }
}
