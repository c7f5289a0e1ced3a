//! `ioc_graph`: an inversion-of-control container built around a memoizing
//! dependency graph resolver.
//!
//! Types are declared up front with [`TypeManifest`]s. Asking the
//! [`Container`] for a type resolves its constructor dependencies into an
//! acyclic [`DependencyMap`], binds interfaces to classes, and builds the graph
//! bottom-up into a singleton cache.

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigLoader, ContainerConfig, Definition, LoadedConfig};
pub use errors::{ConfigError, ContainerError, Result};
pub use infrastructure::{
    Arguments, ArgumentsProvider, Bindings, Container, ContainerStats, DependencyMap, Factory,
    Finalizer, Instance, Module, Provider, Resettable, ServiceView, SharedContainer, TypeKind,
    TypeManifest, TypeRegistry,
};
pub use infrastructure::provider::PROVIDER_INTERFACE;
pub use logging::{init_logging, LogFormat, LoggingConfig};
