use thiserror::Error;

/// Errors raised while resolving, compiling or resetting services.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Type '{0}' is not registered in the container")]
    TypeNotFound(String),
    #[error("Type '{0}' is already registered in the container")]
    TypeAlreadyRegistered(String),
    #[error("{}", interface_binding_message(.interface, .consumer.as_deref()))]
    InterfaceBindingNotFound {
        interface: String,
        consumer: Option<String>,
    },
    #[error("The class {consumer} has a cyclic dependence on the class {dependency}")]
    CircularReference { consumer: String, dependency: String },
    #[error("Type '{0}' is marked for reset but its instance does not implement reset")]
    ResetNotSupported(String),
    #[error("Instance of {0} not found")]
    InstanceNotFound(String),
    #[error("Instance stored as '{name}' is not of type {expected}")]
    InstanceTypeMismatch { name: String, expected: &'static str },
    #[error("Type '{0}' is abstract and cannot be constructed")]
    NotConstructible(String),
    #[error("Type '{0}' has no constructor; set an instance of it on the container")]
    NoConstructor(String),
    #[error("Class '{class}' does not implement interface '{interface}'")]
    NotAnImplementation { class: String, interface: String },
    #[error("Missing argument '{0}'")]
    MissingArgument(String),
    #[error("Argument '{parameter}' is not of type {expected}")]
    ArgumentTypeMismatch {
        parameter: String,
        expected: &'static str,
    },
    #[error("Failed to construct '{class}': {source}")]
    ConstructionFailed {
        class: String,
        source: Box<ContainerError>,
    },
    #[error("Dependency graph is inconsistent: '{consumer}' requires '{dependency}' which has not been built")]
    InconsistentGraph { consumer: String, dependency: String },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Other(String),
}

fn interface_binding_message(interface: &str, consumer: Option<&str>) -> String {
    match consumer {
        Some(consumer) => format!(
            "Binding for interface '{}' requested by '{}' not found",
            interface, consumer
        ),
        None => format!("Binding for interface '{}' not found", interface),
    }
}

impl ContainerError {
    /// Wraps an error raised by user construction code with the class it was building.
    pub fn construction(class: &str, source: ContainerError) -> Self {
        ContainerError::ConstructionFailed {
            class: class.to_string(),
            source: Box::new(source),
        }
    }

    /// Builds an `Other` error from any message, for use inside constructors and hooks.
    pub fn other(message: impl Into<String>) -> Self {
        ContainerError::Other(message.into())
    }

    /// Returns the innermost error, looking through `ConstructionFailed` wrappers.
    pub fn root_cause(&self) -> &ContainerError {
        match self {
            ContainerError::ConstructionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Definition '{class}.{parameter}' holds an unsupported {kind} value")]
    UnsupportedValue {
        class: String,
        parameter: String,
        kind: &'static str,
    },
    #[error("Unknown log format '{0}'")]
    UnknownLogFormat(String),
    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
}

pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
