//! Loading configuration from files and the environment

use folio_config::*;
use std::env;
use std::fs;

#[test]
fn test_load_files_by_extension() {
    let dir = env::temp_dir().join(format!("folio-config-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let json = dir.join("folio.json");
    fs::write(&json, r#"{"binding": {"max_validation_depth": 8}}"#).unwrap();
    let toml = dir.join("folio.toml");
    fs::write(&toml, "[page]\nallow_handler_from_query = false\n").unwrap();

    let config = ConfigManager::new();
    config.load_file(&json).unwrap();
    config.load_file(&toml).unwrap();

    assert_eq!(config.binding_options().unwrap().max_validation_depth, 8);
    assert!(!config.page_options().unwrap().allow_handler_from_query);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unsupported_and_missing_files() {
    let config = ConfigManager::new();
    assert!(matches!(config.load_file("folio.yaml"), Err(ConfigError::LoadError(_))));
    assert!(matches!(
        config.load_file("/nonexistent/folio.json"),
        Err(ConfigError::LoadError(_))
    ));
}

#[test]
fn test_env_with_prefix() {
    unsafe {
        env::set_var("FOLIOIT_BINDING__MAX_MODEL_BINDING_COLLECTION_SIZE", "3");
        env::set_var("FOLIOIT_PAGE__HANDLER_ROUTE_KEY", "do");
    }

    let config = ConfigManager::with_prefix("FOLIOIT");
    config.load_env().unwrap();

    assert_eq!(config.binding_options().unwrap().max_model_binding_collection_size, 3);
    assert_eq!(config.page_options().unwrap().handler_route_key, "do");

    unsafe {
        env::remove_var("FOLIOIT_BINDING__MAX_MODEL_BINDING_COLLECTION_SIZE");
        env::remove_var("FOLIOIT_PAGE__HANDLER_ROUTE_KEY");
    }
}

#[test]
fn test_dotenv_file() {
    let dir = env::temp_dir().join(format!("folio-dotenv-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(".env");
    fs::write(&path, "FOLIODOT_BINDING__ALLOW_EMPTY_BODY=true\n").unwrap();

    let config = ConfigManager::with_prefix("FOLIODOT");
    config.load_dotenv(Some(&path)).unwrap();
    assert!(config.binding_options().unwrap().allow_empty_body);

    unsafe {
        env::remove_var("FOLIODOT_BINDING__ALLOW_EMPTY_BODY");
    }
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::InvalidSection {
        section: "page".to_string(),
        message: "bad".to_string(),
    };
    assert_eq!(err.to_string(), "Invalid configuration section 'page': bad");
}
