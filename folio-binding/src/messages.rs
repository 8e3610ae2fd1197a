// Messages reported by the binders, each replaceable per type or property

use std::fmt;
use std::sync::Arc;

pub type MessageAccessor = Arc<dyn Fn() -> String + Send + Sync>;
pub type MessageAccessor1 = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type MessageAccessor2 = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ModelBindingMessageProvider {
    missing_bind_required_value: MessageAccessor1,
    missing_key_or_value: MessageAccessor,
    missing_request_body_required_value: MessageAccessor,
    value_must_not_be_null: MessageAccessor1,
    attempted_value_is_invalid: MessageAccessor2,
}

impl Default for ModelBindingMessageProvider {
    fn default() -> Self {
        Self {
            missing_bind_required_value: Arc::new(|name| {
                format!("A value for the '{}' property was not provided.", name)
            }),
            missing_key_or_value: Arc::new(|| "A value is required.".to_string()),
            missing_request_body_required_value: Arc::new(|| {
                "A non-empty request body is required.".to_string()
            }),
            value_must_not_be_null: Arc::new(|value| format!("The value '{}' is invalid.", value)),
            attempted_value_is_invalid: Arc::new(|value, name| {
                format!("The value '{}' is not valid for {}.", value, name)
            }),
        }
    }
}

impl ModelBindingMessageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bind-required field received no value; the argument is the field name
    pub fn missing_bind_required_value(&self, field_name: &str) -> String {
        (self.missing_bind_required_value)(field_name)
    }

    /// One side of a key/value pair was bound without the other
    pub fn missing_key_or_value(&self) -> String {
        (self.missing_key_or_value)()
    }

    pub fn missing_request_body_required_value(&self) -> String {
        (self.missing_request_body_required_value)()
    }

    /// An empty value was posted for a non-nullable type
    pub fn value_must_not_be_null(&self, attempted_value: &str) -> String {
        (self.value_must_not_be_null)(attempted_value)
    }

    /// A value could not be converted; the second argument names the field or type
    pub fn attempted_value_is_invalid(&self, attempted_value: &str, name: &str) -> String {
        (self.attempted_value_is_invalid)(attempted_value, name)
    }

    pub fn set_missing_bind_required_value_accessor(
        &mut self,
        accessor: impl Fn(&str) -> String + Send + Sync + 'static,
    ) {
        self.missing_bind_required_value = Arc::new(accessor);
    }

    pub fn set_missing_key_or_value_accessor(
        &mut self,
        accessor: impl Fn() -> String + Send + Sync + 'static,
    ) {
        self.missing_key_or_value = Arc::new(accessor);
    }

    pub fn set_missing_request_body_required_value_accessor(
        &mut self,
        accessor: impl Fn() -> String + Send + Sync + 'static,
    ) {
        self.missing_request_body_required_value = Arc::new(accessor);
    }

    pub fn set_value_must_not_be_null_accessor(
        &mut self,
        accessor: impl Fn(&str) -> String + Send + Sync + 'static,
    ) {
        self.value_must_not_be_null = Arc::new(accessor);
    }

    pub fn set_attempted_value_is_invalid_accessor(
        &mut self,
        accessor: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) {
        self.attempted_value_is_invalid = Arc::new(accessor);
    }
}

impl fmt::Debug for ModelBindingMessageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBindingMessageProvider").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages() {
        let messages = ModelBindingMessageProvider::new();
        assert_eq!(
            messages.missing_bind_required_value("Customer"),
            "A value for the 'Customer' property was not provided."
        );
        assert_eq!(messages.missing_key_or_value(), "A value is required.");
        assert_eq!(messages.value_must_not_be_null(""), "The value '' is invalid.");
        assert_eq!(
            messages.attempted_value_is_invalid("abcd", "Int32"),
            "The value 'abcd' is not valid for Int32."
        );
        assert_eq!(
            messages.missing_request_body_required_value(),
            "A non-empty request body is required."
        );
    }

    #[test]
    fn test_accessor_override() {
        let mut messages = ModelBindingMessageProvider::new();
        messages.set_missing_bind_required_value_accessor(|name| {
            format!("Hurts when '{}' is not provided.", name)
        });
        assert_eq!(
            messages.missing_bind_required_value("Customer"),
            "Hurts when 'Customer' is not provided."
        );
    }
}
