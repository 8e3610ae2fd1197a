// Model state assertions

use folio_binding::{ModelStateDictionary, ModelStateEntry, ModelValidationState};

fn keys(state: &ModelStateDictionary) -> Vec<&str> {
    state.keys().collect()
}

/// Assert that `key` has an entry in `expected` state and return it
#[track_caller]
pub fn assert_model_state_entry<'a>(
    state: &'a ModelStateDictionary,
    key: &str,
    expected: ModelValidationState,
) -> &'a ModelStateEntry {
    let entry = state.get(key).unwrap_or_else(|| {
        panic!("Expected a model state entry for '{}', found keys {:?}", key, keys(state))
    });
    assert_eq!(
        entry.validation_state, expected,
        "Expected '{}' to be {:?}, got {:?}",
        key, expected, entry.validation_state
    );
    entry
}

/// Assert that `key` is invalid with exactly one error reading `message`
#[track_caller]
pub fn assert_single_error(state: &ModelStateDictionary, key: &str, message: &str) {
    let entry = assert_model_state_entry(state, key, ModelValidationState::Invalid);
    let messages: Vec<&str> = entry.errors.iter().map(|e| e.error_message.as_str()).collect();
    assert_eq!(messages, vec![message], "Unexpected errors for '{}'", key);
}

#[track_caller]
pub fn assert_valid(state: &ModelStateDictionary) {
    assert!(
        state.is_valid(),
        "Expected valid model state, got errors {}",
        state.to_json()
    );
}

#[track_caller]
pub fn assert_invalid(state: &ModelStateDictionary) {
    assert!(!state.is_valid(), "Expected invalid model state, keys {:?}", keys(state));
}

/// Assert the comma-joined attempted value recorded for `key`
#[track_caller]
pub fn assert_attempted_value(state: &ModelStateDictionary, key: &str, expected: &str) {
    let entry = state
        .get(key)
        .unwrap_or_else(|| panic!("Expected a model state entry for '{}'", key));
    assert_eq!(entry.attempted_value.as_deref(), Some(expected));
}
