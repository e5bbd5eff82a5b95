//! Configuration loading.
//!
//! Definition documents and operations are loaded from YAML or JSON files
//! (the CLI and test fixtures use this path); Neo4j connection settings
//! come from the environment, with `.env` support.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::translate::Operation;
use crate::type_defs::DefinitionDocument;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Failed to read \"{path}\": {message}")]
    Read { path: String, message: String },
    #[error("Failed to parse \"{path}\": {message}")]
    Parse { path: String, message: String },
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn parse_document<T: serde::de::DeserializeOwned>(
    path: &Path,
    content: &str,
) -> Result<T, ConfigError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let result = if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    };
    result.map_err(|message| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    })
}

/// Load a definition document from a YAML or JSON file.
pub fn load_definitions(path: impl AsRef<Path>) -> Result<DefinitionDocument, ConfigError> {
    let path = path.as_ref();
    let content = read_file(path)?;
    parse_document(path, &content)
}

/// Load a resolved operation from a YAML or JSON file.
pub fn load_operation(path: impl AsRef<Path>) -> Result<Operation, ConfigError> {
    let path = path.as_ref();
    let content = read_file(path)?;
    parse_document(path, &content)
}

/// Connection settings for the admin path. Session management itself is
/// the driver's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
}

impl Neo4jConfig {
    /// Read settings from `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` and
    /// `NEO4J_DATABASE`, honoring a `.env` file when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Neo4jConfig {
            uri: env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "neo4j".to_string()),
            database: env::var("NEO4J_DATABASE").ok(),
        }
    }
}
