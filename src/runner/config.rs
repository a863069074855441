//! Runtime configuration, loaded from TOML.
//!
//! ```toml
//! max_call_depth = 500
//! max_steps = 1000000
//! implicit_globals = false
//! builtins = true
//!
//! [heap]
//! max_objects = 100000
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::runner::ds::heap::HeapConfig;
use crate::runner::plugin::types::ExecutionLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub max_call_depth: usize,
    /// Statement and call budget for one evaluation. None means unbounded.
    pub max_steps: Option<u64>,
    pub implicit_globals: bool,
    /// Install console, Math, Array and the other core built-ins.
    pub builtins: bool,
    pub heap: HeapConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let limits = ExecutionLimits::default();
        RuntimeConfig {
            max_call_depth: limits.max_call_depth,
            max_steps: limits.max_steps,
            implicit_globals: limits.implicit_globals,
            builtins: true,
            heap: HeapConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&source)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        if self.heap.max_objects == Some(0) {
            return Err(ConfigError::Invalid(
                "heap.max_objects must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            max_call_depth: self.max_call_depth,
            max_steps: self.max_steps,
            implicit_globals: self.implicit_globals,
        }
    }
}
