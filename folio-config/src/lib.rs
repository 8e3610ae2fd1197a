//! Layered configuration for Folio
//!
//! Sources are merged in the order they are loaded; later sources win key
//! by key. Keys are dotted paths into a JSON tree (`binding.max_model_errors`),
//! so a TOML `[binding]` table, a JSON `{"binding": {..}}` object and a
//! `FOLIO_BINDING__MAX_MODEL_ERRORS` variable all land in the same place.
//!
//! ```
//! use folio_config::{ConfigManager, FileFormat};
//!
//! let config = ConfigManager::new();
//! config
//!     .load_str("[binding]\nmax_model_errors = 10", FileFormat::Toml)
//!     .unwrap();
//!
//! assert_eq!(config.binding_options().unwrap().max_model_errors, 10);
//! assert_eq!(config.page_options().unwrap().handler_route_key, "handler");
//! ```

pub mod env;
pub mod error;
pub mod loader;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};

use folio_binding::BindingOptions;
use folio_core::Provider;
use folio_core::logging::{LogConfig, debug, trace};
use folio_pages::PageOptions;
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Section read by [`ConfigManager::binding_options`]
pub const BINDING_SECTION: &str = "binding";

/// Section read by [`ConfigManager::page_options`]
pub const PAGE_SECTION: &str = "page";

/// Section read by [`ConfigManager::log_config`]
pub const LOGGING_SECTION: &str = "logging";

#[derive(Clone, Default)]
pub struct ConfigManager {
    root: Arc<RwLock<Map<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only environment variables starting with `prefix` are loaded
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            root: Arc::default(),
            env_prefix: Some(prefix.into()),
        }
    }

    pub fn load_env(&self) -> Result<()> {
        let vars = EnvLoader::new(self.env_prefix.clone()).load();
        debug!(count = vars.len(), prefix = ?self.env_prefix, "Loaded environment configuration");

        let mut root = self.root.write();
        for (key, value) in vars {
            insert_path(&mut root, &key, value);
        }
        Ok(())
    }

    /// Load a `.env` file into the process environment, then the environment.
    ///
    /// Without a path a missing `.env` in the working directory is ignored.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                if let Err(e) = dotenvy::dotenv() {
                    trace!(error = %e, "No .env file loaded");
                }
            }
        }
        self.load_env()
    }

    /// Merge a configuration file, detecting the format from its name
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let value = ConfigLoader::auto(path)?.load_file(path)?;
        debug!(path = %path.display(), "Loaded configuration file");
        self.merge_value(value);
        Ok(())
    }

    pub fn load_str(&self, content: &str, format: FileFormat) -> Result<()> {
        let value = ConfigLoader::new(format).parse(content)?;
        self.merge_value(value);
        Ok(())
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value =
            serde_json::to_value(value).map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        insert_path(&mut self.root.write(), key, value);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .value(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        serde_json::from_value(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// The raw value at `key`
    pub fn value(&self, key: &str) -> Option<Value> {
        let root = self.root.read();
        let mut segments = key.split('.');
        let mut current = root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Top-level keys
    pub fn keys(&self) -> Vec<String> {
        self.root.read().keys().cloned().collect()
    }

    /// Merge `other` into this configuration; its values win
    pub fn merge(&self, other: &ConfigManager) {
        let value = Value::Object(other.root.read().clone());
        self.merge_value(value);
    }

    /// Deserialize `section`, or the default when it is absent
    pub fn section_or_default<T>(&self, section: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.value(section) {
            None => Ok(T::default()),
            Some(value) => serde_json::from_value(value).map_err(|e| ConfigError::InvalidSection {
                section: section.to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn binding_options(&self) -> Result<BindingOptions> {
        self.section_or_default(BINDING_SECTION)
    }

    pub fn page_options(&self) -> Result<PageOptions> {
        self.section_or_default(PAGE_SECTION)
    }

    /// Logging setup for [`LogConfig::init`]
    pub fn log_config(&self) -> Result<LogConfig> {
        self.section_or_default(LOGGING_SECTION)
    }

    fn merge_value(&self, value: Value) {
        if let Value::Object(source) = value {
            merge_maps(&mut self.root.write(), source);
        }
    }
}

impl Provider for ConfigManager {}

/// Set the dotted `key` inside `root`, creating sections on the way
pub(crate) fn insert_path(root: &mut Map<String, Value>, key: &str, value: Value) {
    match key.split_once('.') {
        None => {
            root.insert(key.to_string(), value);
        }
        Some((section, rest)) => {
            let entry = root
                .entry(section.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

fn merge_maps(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        let Value::Object(incoming) = value else {
            target.insert(key, value);
            continue;
        };
        if let Some(Value::Object(existing)) = target.get_mut(&key) {
            merge_maps(existing, incoming);
            continue;
        }
        target.insert(key, Value::Object(incoming));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let config = ConfigManager::new();
        config.set("binding.max_model_errors", 5).unwrap();
        config.set("name", "orders").unwrap();

        assert_eq!(config.get::<usize>("binding.max_model_errors").unwrap(), 5);
        assert_eq!(config.get::<String>("name").unwrap(), "orders");
        assert!(matches!(config.get::<String>("missing"), Err(ConfigError::KeyNotFound(_))));
        assert_eq!(config.get_or("missing", 3), 3);
    }

    #[test]
    fn test_later_sources_win() {
        let config = ConfigManager::new();
        config
            .load_str(r#"{"binding": {"max_model_errors": 5, "allow_empty_body": true}}"#, FileFormat::Json)
            .unwrap();
        config
            .load_str("[binding]\nmax_model_errors = 7", FileFormat::Toml)
            .unwrap();

        let options = config.binding_options().unwrap();
        assert_eq!(options.max_model_errors, 7);
        assert!(options.allow_empty_body);
        assert_eq!(options.max_model_binding_collection_size, 1024);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = ConfigManager::new();
        assert_eq!(config.binding_options().unwrap(), BindingOptions::default());
        assert_eq!(config.page_options().unwrap(), PageOptions::default());
    }

    #[test]
    fn test_log_config_section() {
        use folio_core::logging::{LogFormat, LogLevel, LogOutput, Rotation};

        let config = ConfigManager::new();
        assert_eq!(config.log_config().unwrap().output, LogOutput::Stdout);

        config
            .load_str(
                "[logging]\nlevel = \"debug\"\nformat = \"json\"\nenv_filter = \"folio_binding=trace\"\n\n[logging.output.rolling_file]\ndirectory = \"logs\"\nprefix = \"folio\"\nrotation = \"daily\"\n",
                FileFormat::Toml,
            )
            .unwrap();

        let logging = config.log_config().unwrap();
        assert_eq!(logging.level, LogLevel::Debug);
        assert_eq!(logging.format, LogFormat::Json);
        assert_eq!(logging.env_filter.as_deref(), Some("folio_binding=trace"));
        assert_eq!(
            logging.output,
            LogOutput::RollingFile {
                directory: "logs".to_string(),
                prefix: "folio".to_string(),
                rotation: Rotation::Daily,
            }
        );
    }

    #[test]
    fn test_invalid_section() {
        let config = ConfigManager::new();
        config.set("page", json!({"allow_handler_from_query": "sometimes"})).unwrap();
        match config.page_options() {
            Err(ConfigError::InvalidSection { section, .. }) => assert_eq!(section, "page"),
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_merge_managers() {
        let base = ConfigManager::new();
        base.set("page.handler_route_key", "action").unwrap();
        let overrides = ConfigManager::new();
        overrides.set("page.head_falls_back_to_get", false).unwrap();

        base.merge(&overrides);
        let options = base.page_options().unwrap();
        assert_eq!(options.handler_route_key, "action");
        assert!(!options.head_falls_back_to_get);
        assert_eq!(base.keys(), vec!["page".to_string()]);
    }

    #[test]
    fn test_insert_path_replaces_scalars() {
        let mut root = Map::new();
        insert_path(&mut root, "binding", json!(1));
        insert_path(&mut root, "binding.max_model_errors", json!(2));
        assert_eq!(Value::Object(root), json!({"binding": {"max_model_errors": 2}}));
    }
}
