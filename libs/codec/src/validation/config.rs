//! # Validator Configuration Module
//!
//! Which schema to generate from, which protocol versions to assemble and
//! whether rejected messages are logged. Defaults give the bundled OpenFlow
//! schema with every version enabled.

use crate::error::ConfigError;
use schema::{ProtocolVersion, Schema, SchemaDocument, SchemaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Validator generation and runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// External schema document; the bundled OpenFlow schema when unset
    pub schema_path: Option<PathBuf>,

    /// Versions to assemble validators for
    pub versions: Vec<ProtocolVersion>,

    /// Log a warning for every rejected message
    pub log_failures: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            schema_path: None,
            versions: ProtocolVersion::ALL.to_vec(),
            log_failures: true,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `OFVAL_*` overrides read through `lookup`; unparsable values are ignored
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("OFVAL_SCHEMA_PATH") {
            if !path.is_empty() {
                self.schema_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("OFVAL_VERSIONS") {
            if let Some(versions) = parse_versions(&val) {
                self.versions = versions;
            }
        }

        if let Some(val) = lookup("OFVAL_LOG_FAILURES") {
            if let Ok(flag) = val.parse() {
                self.log_failures = flag;
            }
        }

        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Schema named by `schema_path`, or the bundled OpenFlow schema
    pub fn load_schema(&self) -> SchemaResult<Arc<Schema>> {
        match &self.schema_path {
            Some(path) => SchemaDocument::load(path)?.build().map(Arc::new),
            None => schema::openflow(),
        }
    }
}

/// Comma separated wire bytes, e.g. `"1,4"`
fn parse_versions(val: &str) -> Option<Vec<ProtocolVersion>> {
    val.split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .ok()
                .and_then(|byte| ProtocolVersion::try_from(byte).ok())
        })
        .collect()
}
