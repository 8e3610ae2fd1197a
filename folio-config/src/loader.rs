// Configuration file parsing

use crate::env::{EnvLoader, parse_scalar};
use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Format of `path`; `.env` files have no extension
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.file_name().is_some_and(|name| name == ".env") {
            return Some(FileFormat::Env);
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Parses one file into a JSON object tree
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path).ok_or_else(|| {
            ConfigError::LoadError(format!("Unsupported configuration file: {}", path.display()))
        })?;
        Ok(Self::new(format))
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.parse(&content)
    }

    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => parse_json(content),
            FileFormat::Toml => parse_toml(content),
            FileFormat::Env => parse_env(content),
        }
    }
}

fn parse_json(content: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))?;
    if !value.is_object() {
        return Err(ConfigError::ParseError(
            "JSON configuration must be an object".to_string(),
        ));
    }
    Ok(value)
}

fn parse_toml(content: &str) -> Result<Value> {
    let table: toml::Table = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;
    serde_json::to_value(table).map_err(|e| ConfigError::SerializationError(e.to_string()))
}

/// `KEY=value` lines with the same key nesting as environment variables
fn parse_env(content: &str) -> Result<Value> {
    let mut root = Map::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::ParseError(format!("Expected KEY=value, got '{}'", line)));
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        crate::insert_path(&mut root, &EnvLoader::key_path(key.trim()), parse_scalar(value));
    }
    Ok(Value::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json() {
        let loader = ConfigLoader::new(FileFormat::Json);
        let value = loader.parse(r#"{"binding": {"max_model_errors": 5}}"#).unwrap();
        assert_eq!(value["binding"]["max_model_errors"], 5);

        assert!(loader.parse("[1, 2]").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let loader = ConfigLoader::new(FileFormat::Toml);
        let value = loader
            .parse(
                r#"
                [page]
                handler_route_key = "action"
                "#,
            )
            .unwrap();
        assert_eq!(value, json!({"page": {"handler_route_key": "action"}}));
    }

    #[test]
    fn test_parse_env() {
        let loader = ConfigLoader::new(FileFormat::Env);
        let value = loader
            .parse(
                r#"
                # binding limits
                BINDING__MAX_MODEL_BINDING_COLLECTION_SIZE=10
                QUOTED="quoted value"
                "#,
            )
            .unwrap();

        assert_eq!(value["binding"]["max_model_binding_collection_size"], 10);
        assert_eq!(value["quoted"], "quoted value");
        assert!(loader.parse("NOT A PAIR").is_err());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_extension("JSON"), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("folio.toml")), Some(FileFormat::Toml));
        assert_eq!(FileFormat::from_path(Path::new("/app/.env")), Some(FileFormat::Env));
        assert_eq!(FileFormat::from_path(Path::new("folio.yaml")), None);
    }
}
