// Environment variable source
//
// `FOLIO_BINDING__MAX_MODEL_ERRORS=50` with prefix `FOLIO` becomes the key
// `binding.max_model_errors`; a double underscore separates sections.

use crate::{ConfigError, Result};
use serde_json::Value;
use std::env;

pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Variables as `(dotted key, value)` pairs, filtered by the prefix
    pub fn load(&self) -> Vec<(String, Value)> {
        self.collect(env::vars())
    }

    fn collect(&self, vars: impl IntoIterator<Item = (String, String)>) -> Vec<(String, Value)> {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let key = match &self.prefix {
                    Some(prefix) => key.strip_prefix(prefix.as_str())?.trim_start_matches('_').to_string(),
                    None => key,
                };
                if key.is_empty() {
                    return None;
                }
                Some((Self::key_path(&key), parse_scalar(&value)))
            })
            .collect()
    }

    /// `BINDING__MAX_MODEL_ERRORS` -> `binding.max_model_errors`
    pub fn key_path(name: &str) -> String {
        name.split("__")
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// One variable, looked up with the prefix applied
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };
        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Numbers and booleans keep their type so options deserialize from them
pub(crate) fn parse_scalar(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
