use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::data_types::DEFAULT_UPLOAD_FILENAME;
use crate::pagination::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};

pub const DEFAULT_SQLITE_DB: &str = "contacts.sqlite";
pub const ENV_PREFIX: &str = "FMCONTAINER";

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct FmContainerConfig {
    pub store: Store,
    #[serde(default)]
    pub container: Container,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Store {
    #[cfg(feature = "store-postgres")]
    Postgres(Postgres),
    Sqlite(Sqlite),
}

impl Store {
    pub fn max_connections(&self) -> u32 {
        match self {
            #[cfg(feature = "store-postgres")]
            Store::Postgres(Postgres {
                max_connections, ..
            }) => *max_connections,
            Store::Sqlite(Sqlite {
                max_connections, ..
            }) => *max_connections,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Postgres {
    pub dsn: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Sqlite {
    pub dsn: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_max_connections() -> u32 {
    8
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Container {
    pub default_filename: String,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            default_filename: DEFAULT_UPLOAD_FILENAME.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Pagination {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

pub fn validate_config(config: FmContainerConfig) -> Result<FmContainerConfig, ConfigError> {
    if config.store.max_connections() == 0 {
        return Err(ConfigError::Message(
            "The store needs at least one connection (max_connections = 0)".to_string(),
        ));
    }

    // Every connection to an in-memory SQLite database opens a separate one
    let in_memory_store = matches!(config.store, Store::Sqlite(Sqlite { ref dsn, .. }) if dsn.contains(":memory:"));
    if in_memory_store && config.store.max_connections() > 1 {
        return Err(ConfigError::Message(
            "You are using an in-memory SQLite store with more than one connection. \
        Each connection would see a different database."
                .to_string(),
        ));
    }

    let Pagination {
        default_size,
        max_size,
    } = config.pagination;
    if default_size == 0 {
        return Err(ConfigError::Message(
            "pagination.default_size must be positive".to_string(),
        ));
    }
    if default_size > max_size {
        return Err(ConfigError::Message(format!(
            "pagination.default_size ({default_size}) is larger than pagination.max_size ({max_size})"
        )));
    }

    Ok(config)
}

fn environment(env_override: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .source(env_override)
}

pub fn load_config(path: &Path) -> Result<FmContainerConfig, ConfigError> {
    let path = path
        .to_str()
        .ok_or_else(|| ConfigError::Message(format!("Invalid config path {path:?}")))?;
    let config = Config::builder()
        .add_source(File::with_name(path))
        .add_source(environment(None));

    config.build()?.try_deserialize().and_then(validate_config)
}

// Load a config from a string (to test our structs are defined correctly)
pub fn load_config_from_string(
    config_str: &str,
    skip_validation: bool,
    env_override: Option<HashMap<String, String>>,
) -> Result<FmContainerConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(config_str, FileFormat::Toml))
        .add_source(environment(env_override));

    if skip_validation {
        config.build()?.try_deserialize()
    } else {
        config.build()?.try_deserialize().and_then(validate_config)
    }
}
