//! Container configuration
//!
//! `ContainerConfig` is applied by `Container::with_config` in the order
//! providers, bindings, definitions. `loader` reads the same data from TOML.

pub mod loader;

pub use loader::{ConfigLoader, LoadedConfig};

use crate::infrastructure::binding::Bindings;
use crate::infrastructure::manifest::Arguments;
use crate::infrastructure::provider::Provider;
use std::fmt;
use std::sync::Arc;

/// Fixed constructor arguments for one class.
#[derive(Debug, Clone)]
pub struct Definition {
    pub class: String,
    pub arguments: Arguments,
}

impl Definition {
    pub fn new(class: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            class: class.into(),
            arguments,
        }
    }
}

#[derive(Clone, Default)]
pub struct ContainerConfig {
    pub bindings: Bindings,
    pub providers: Vec<(String, Arc<dyn Provider>)>,
    pub definitions: Vec<Definition>,
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding(mut self, interface: impl Into<String>, class: impl Into<String>) -> Self {
        self.bindings.insert(interface.into(), class.into());
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings.extend(bindings);
        self
    }

    pub fn with_provider(mut self, key: impl Into<String>, provider: impl Provider + 'static) -> Self {
        self.providers.push((key.into(), Arc::new(provider)));
        self
    }

    pub fn with_definition(mut self, definition: Definition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Appends `other`; its bindings override ours.
    pub fn merge(mut self, other: ContainerConfig) -> Self {
        self.bindings.extend(other.bindings);
        self.providers.extend(other.providers);
        self.definitions.extend(other.definitions);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.providers.is_empty() && self.definitions.is_empty()
    }
}

impl fmt::Debug for ContainerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerConfig")
            .field("bindings", &self.bindings)
            .field(
                "providers",
                &self.providers.iter().map(|(key, _)| key).collect::<Vec<_>>(),
            )
            .field("definitions", &self.definitions)
            .finish()
    }
}
