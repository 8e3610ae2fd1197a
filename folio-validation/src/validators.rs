// Pattern-based attributes backed by shared regexes

use crate::messages::ErrorMessage;
use crate::traits::{ValidationAttribute, scalar_text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$")
        .expect("email pattern is valid")
});

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i:https?|ftp)://[^\s/$.?#].[^\s]*$").expect("url pattern is valid"));

pub const EMAIL_MESSAGE: &str = "The {0} field is not a valid e-mail address.";
pub const URL_MESSAGE: &str = "The {0} field is not a valid fully-qualified http, https, or ftp URL.";

/// E-mail address format; null passes
#[derive(Debug, Clone, Default)]
pub struct EmailAddress {
    pub message: ErrorMessage,
}

impl ValidationAttribute for EmailAddress {
    fn name(&self) -> &'static str {
        "email"
    }

    fn is_valid(&self, value: &Value) -> bool {
        scalar_text(value).is_none_or(|text| EMAIL_REGEX.is_match(&text))
    }

    fn format_error_message(&self, display_name: &str) -> String {
        self.message.format(EMAIL_MESSAGE, &[display_name])
    }
}

/// Absolute http, https or ftp URL; null passes
#[derive(Debug, Clone, Default)]
pub struct Url {
    pub message: ErrorMessage,
}

impl ValidationAttribute for Url {
    fn name(&self) -> &'static str {
        "url"
    }

    fn is_valid(&self, value: &Value) -> bool {
        scalar_text(value).is_none_or(|text| URL_REGEX.is_match(&text))
    }

    fn format_error_message(&self, display_name: &str) -> String {
        self.message.format(URL_MESSAGE, &[display_name])
    }
}
