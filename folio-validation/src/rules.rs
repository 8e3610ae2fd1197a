// Built-in validation attributes

use crate::messages::{ErrorMessage, MessageFormatter};
use crate::traits::{ValidationAttribute, scalar_text};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub const REQUIRED_MESSAGE: &str = "The {0} field is required.";
pub const STRING_LENGTH_MESSAGE: &str = "The field {0} must be a string with a maximum length of {1}.";
pub const STRING_LENGTH_WITH_MINIMUM_MESSAGE: &str =
    "The field {0} must be a string with a minimum length of {2} and a maximum length of {1}.";
pub const RANGE_MESSAGE: &str = "The field {0} must be between {1} and {2}.";
pub const REGULAR_EXPRESSION_MESSAGE: &str = "The field {0} must match the regular expression '{1}'.";

/// Fails for null, and for empty or whitespace strings unless allowed
#[derive(Debug, Clone, Default)]
pub struct Required {
    pub allow_empty_strings: bool,
    pub message: ErrorMessage,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_empty_strings(mut self) -> Self {
        self.allow_empty_strings = true;
        self
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = ErrorMessage::Template(template.into());
        self
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.message = ErrorMessage::Formatter(formatter);
        self
    }
}

impl ValidationAttribute for Required {
    fn name(&self) -> &'static str {
        "required"
    }

    fn is_valid(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::String(s) => self.allow_empty_strings || !s.trim().is_empty(),
            _ => true,
        }
    }

    fn format_error_message(&self, display_name: &str) -> String {
        self.message.format(REQUIRED_MESSAGE, &[display_name])
    }
}

/// Bounds the character count of a string value
#[derive(Debug, Clone)]
pub struct StringLength {
    pub maximum: usize,
    pub minimum: usize,
    pub message: ErrorMessage,
}

impl StringLength {
    pub fn new(maximum: usize) -> Self {
        Self {
            maximum,
            minimum: 0,
            message: ErrorMessage::Default,
        }
    }

    pub fn minimum(mut self, minimum: usize) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = ErrorMessage::Template(template.into());
        self
    }
}

impl ValidationAttribute for StringLength {
    fn name(&self) -> &'static str {
        "stringLength"
    }

    fn is_valid(&self, value: &Value) -> bool {
        match scalar_text(value) {
            None => true,
            Some(text) => {
                let len = text.chars().count();
                len >= self.minimum && len <= self.maximum
            }
        }
    }

    fn format_error_message(&self, display_name: &str) -> String {
        let template = if self.minimum > 0 {
            STRING_LENGTH_WITH_MINIMUM_MESSAGE
        } else {
            STRING_LENGTH_MESSAGE
        };
        self.message.format(
            template,
            &[display_name, &self.maximum.to_string(), &self.minimum.to_string()],
        )
    }
}

/// Inclusive numeric range; numeric strings are parsed, null passes
#[derive(Debug, Clone)]
pub struct Range {
    pub minimum: f64,
    pub maximum: f64,
    pub message: ErrorMessage,
}

impl Range {
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum,
            maximum,
            message: ErrorMessage::Default,
        }
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = ErrorMessage::Template(template.into());
        self
    }
}

impl ValidationAttribute for Range {
    fn name(&self) -> &'static str {
        "range"
    }

    fn is_valid(&self, value: &Value) -> bool {
        let number = match value {
            Value::Null => return true,
            Value::Number(n) => n.as_f64(),
            Value::String(s) if s.is_empty() => return true,
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.is_some_and(|n| n >= self.minimum && n <= self.maximum)
    }

    fn format_error_message(&self, display_name: &str) -> String {
        self.message.format(
            RANGE_MESSAGE,
            &[display_name, &self.minimum.to_string(), &self.maximum.to_string()],
        )
    }
}

/// The whole text must match the pattern; null and empty values pass
#[derive(Debug, Clone)]
pub struct RegularExpression {
    pattern: String,
    regex: Regex,
    pub message: ErrorMessage,
}

impl RegularExpression {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: pattern.to_string(),
            regex: Regex::new(&format!("^(?:{})$", pattern))?,
            message: ErrorMessage::Default,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        self.message = ErrorMessage::Template(template.into());
        self
    }
}

impl ValidationAttribute for RegularExpression {
    fn name(&self) -> &'static str {
        "regularExpression"
    }

    fn is_valid(&self, value: &Value) -> bool {
        match scalar_text(value) {
            None => true,
            Some(text) if text.is_empty() => true,
            Some(text) => self.regex.is_match(&text),
        }
    }

    fn format_error_message(&self, display_name: &str) -> String {
        self.message
            .format(REGULAR_EXPRESSION_MESSAGE, &[display_name, &self.pattern])
    }
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Rule backed by a closure
#[derive(Clone)]
pub struct Custom {
    name: &'static str,
    predicate: Predicate,
    template: String,
}

impl Custom {
    /// `template` may use `{0}` for the display name
    pub fn new<F>(name: &'static str, predicate: F, template: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(predicate),
            template: template.into(),
        }
    }
}

impl fmt::Debug for Custom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Custom").field("name", &self.name).finish()
    }
}

impl ValidationAttribute for Custom {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_valid(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    fn format_error_message(&self, display_name: &str) -> String {
        crate::format_template(&self.template, &[display_name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required() {
        let rule = Required::new();
        assert!(!rule.is_valid(&Value::Null));
        assert!(!rule.is_valid(&json!("  ")));
        assert!(rule.is_valid(&json!("x")));
        assert!(rule.is_valid(&json!(0)));
        assert!(Required::new().allow_empty_strings().is_valid(&json!("")));
        assert_eq!(rule.format_error_message("Name"), "The Name field is required.");
    }

    #[test]
    fn test_required_validate_reports_key_and_constraint() {
        let err = Required::new()
            .validate(&Value::Null, "parameter.Name", "Name")
            .unwrap_err();
        assert_eq!(err.field, "parameter.Name");
        assert_eq!(err.constraint, "required");
        assert_eq!(err.value, None);
    }

    #[test]
    fn test_string_length() {
        let rule = StringLength::new(5);
        assert!(rule.is_valid(&json!("héllo")));
        assert!(!rule.is_valid(&json!("toolong")));
        assert!(rule.is_valid(&Value::Null));
        assert_eq!(
            rule.format_error_message("Name"),
            "The field Name must be a string with a maximum length of 5."
        );

        let bounded = StringLength::new(5).minimum(2);
        assert!(!bounded.is_valid(&json!("a")));
        assert_eq!(
            bounded.format_error_message("Name"),
            "The field Name must be a string with a minimum length of 2 and a maximum length of 5."
        );
    }

    #[test]
    fn test_range() {
        let rule = Range::new(1.0, 10.0);
        assert!(rule.is_valid(&json!(5)));
        assert!(rule.is_valid(&json!("10")));
        assert!(!rule.is_valid(&json!(11)));
        assert!(!rule.is_valid(&json!("eleven")));
        assert!(rule.is_valid(&Value::Null));
        assert_eq!(
            rule.format_error_message("Age"),
            "The field Age must be between 1 and 10."
        );
    }

    #[test]
    fn test_regular_expression_matches_whole_value() {
        let rule = RegularExpression::new("[a-z]+").unwrap();
        assert!(rule.is_valid(&json!("abc")));
        assert!(!rule.is_valid(&json!("abc1")));
        assert!(rule.is_valid(&json!("")));
        assert_eq!(
            rule.format_error_message("Code"),
            "The field Code must match the regular expression '[a-z]+'."
        );
    }

    #[test]
    fn test_custom() {
        let even = Custom::new(
            "even",
            |v| v.as_i64().is_some_and(|n| n % 2 == 0),
            "{0} must be even.",
        );
        assert!(even.is_valid(&json!(4)));
        let err = even.validate(&json!(3), "Count", "Count").unwrap_err();
        assert_eq!(err.message, "Count must be even.");
        assert_eq!(err.value.as_deref(), Some("3"));
        assert_eq!(err.constraint, "even");
    }
}
