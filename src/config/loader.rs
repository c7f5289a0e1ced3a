use std::{fs, path::{Path, PathBuf}};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::Level;

use super::{ContainerConfig, Definition};
use crate::errors::ConfigError;
use crate::infrastructure::manifest::Arguments;
use crate::logging::{LogFormat, LoggingConfig};

/// Raw shape of a container TOML file
#[derive(Debug, Default, Deserialize)]
struct ContainerFile {
    #[serde(default)]
    bindings: IndexMap<String, String>,
    #[serde(default)]
    definitions: IndexMap<String, IndexMap<String, toml::Value>>,
    #[serde(default)]
    logging: Option<LoggingSection>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    format: Option<String>,
    show_target: Option<bool>,
    show_thread_ids: Option<bool>,
}

/// Result of loading a configuration file
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub container: ContainerConfig,
    /// Present only when the file has a `[logging]` section
    pub logging: Option<LoggingConfig>,
}

/// Configuration loader responsible for reading container files
#[derive(Debug, Default)]
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { base_path: None }
    }

    /// Relative paths given to `load` are resolved against `base_path`
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<LoadedConfig, ConfigError> {
        let file = file.as_ref();
        match &self.base_path {
            Some(base) if file.is_relative() => Self::from_path(base.join(file)),
            _ => Self::from_path(file),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<LoadedConfig, ConfigError> {
        let path = path.as_ref();
        let source = path.to_string_lossy().to_string();

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(source.clone(), e))?;

        tracing::debug!(path = %source, "loading container configuration");
        Self::from_toml_str(&source, &content)
    }

    /// Parse configuration from TOML text; `source` names it in errors
    pub fn from_toml_str(source: &str, content: &str) -> Result<LoadedConfig, ConfigError> {
        let file: ContainerFile = toml::from_str(content)
            .map_err(|e| ConfigError::TomlParse(source.to_string(), e))?;

        let mut container = ContainerConfig::new().with_bindings(file.bindings);
        for (class, values) in file.definitions {
            let arguments = definition_arguments(&class, values)?;
            container = container.with_definition(Definition::new(class, arguments));
        }

        let logging = file.logging.map(logging_config).transpose()?;

        Ok(LoadedConfig { container, logging })
    }
}

fn definition_arguments(
    class: &str,
    values: IndexMap<String, toml::Value>,
) -> Result<Arguments, ConfigError> {
    let mut arguments = Arguments::new();
    for (parameter, value) in values {
        let unsupported = |kind| ConfigError::UnsupportedValue {
            class: class.to_string(),
            parameter: parameter.clone(),
            kind,
        };
        match value {
            toml::Value::String(s) => arguments.insert(parameter.as_str(), s),
            toml::Value::Integer(i) => arguments.insert(parameter.as_str(), i),
            toml::Value::Float(f) => arguments.insert(parameter.as_str(), f),
            toml::Value::Boolean(b) => arguments.insert(parameter.as_str(), b),
            toml::Value::Datetime(_) => return Err(unsupported("datetime")),
            toml::Value::Array(_) => return Err(unsupported("array")),
            toml::Value::Table(_) => return Err(unsupported("table")),
        }
    }
    Ok(arguments)
}

fn logging_config(section: LoggingSection) -> Result<LoggingConfig, ConfigError> {
    let mut config = LoggingConfig::default();
    if let Some(level) = section.level {
        config.level = level
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidLogLevel(level.clone()))?;
    }
    if let Some(format) = section.format {
        config.format = format.parse::<LogFormat>()?;
    }
    if let Some(show_target) = section.show_target {
        config.show_target = show_target;
    }
    if let Some(show_thread_ids) = section.show_thread_ids {
        config.show_thread_ids = show_thread_ids;
    }
    Ok(config)
}
