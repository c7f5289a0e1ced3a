//! Providers, definitions, provider classes and stale cached leaves.

mod common;

use common::{BuildLog, Clock, Mailer, Newsletter, NullTransport, Transport};
use ioc_graph::{
    bindings, Arguments, ArgumentsProvider, Bindings, Container, ContainerError, Definition,
    Factory, Finalizer, Instance, Provider, ServiceView, TypeManifest, PROVIDER_INTERFACE,
};
use std::sync::Arc;

fn container(log: &BuildLog) -> Container {
    Container::new(common::registry(log))
}

/// Binds `Transport` for whoever it is registered against.
struct TransportBinding(&'static str);

impl Provider for TransportBinding {
    fn bindings(&self) -> Bindings {
        bindings! { "Transport" => self.0 }
    }
}

/// Records every instance it finalizes.
struct Auditing {
    log: BuildLog,
    binding: Option<&'static str>,
}

impl Provider for Auditing {
    fn bindings(&self) -> Bindings {
        match self.binding {
            Some(class) => bindings! { "Transport" => class },
            None => Bindings::new(),
        }
    }

    fn finalizer(&self) -> Option<Finalizer> {
        let log = self.log.clone();
        Some(Arc::new(move |_instance: &Instance| -> ioc_graph::Result<()> {
            log.record("finalized");
            Ok(())
        }))
    }
}

#[test]
fn test_provided_argument_is_never_expanded() {
    let log = BuildLog::default();
    let mut container = container(&log);
    container.bind(bindings! { "Transport" => "SmtpTransport" });
    container.add_provider(
        "Newsletter",
        ArgumentsProvider::new(Arguments::new().with("clock", Clock)),
    );

    let newsletter = container.get::<Newsletter>("Newsletter").unwrap();

    let map = container.dependency_map("Newsletter").unwrap();
    assert_eq!(map.dependency("Newsletter", "clock"), None);
    assert_eq!(map.dependency("Newsletter", "mailer"), Some("Mailer"));
    assert!(!map.contains("Clock"));
    assert_eq!(log.count("Clock"), 0);
    assert!(!container.has("Clock"));
    assert!(container.get_instance("Clock").is_ok());
    assert!(!Arc::ptr_eq(&newsletter.clock, &container.get::<Clock>("Clock").unwrap()));
}

#[test]
fn test_provider_supplying_every_argument_makes_a_leaf() {
    let log = BuildLog::default();
    let mut container = container(&log);
    // No Transport binding exists, so expanding Mailer would fail.
    let mut arguments = Arguments::new().with("sender", String::from("ops@example.com"));
    arguments.insert_as::<dyn Transport>("transport", Arc::new(NullTransport));
    container.add_provider("Mailer", ArgumentsProvider::new(arguments));

    let mailer = container.get::<Mailer>("Mailer").unwrap();

    assert_eq!(mailer.sender, "ops@example.com");
    assert_eq!(mailer.transport.name(), "null");
    let map = container.dependency_map("Mailer").unwrap();
    assert_eq!(map.edge_count(), 0);
    assert!(container.class_map().is_empty());
}

#[test]
fn test_consumer_provider_binding_fills_table() {
    let mut container = container(&BuildLog::default());
    container.add_provider("Mailer", TransportBinding("NullTransport"));

    let mailer = container.get::<Mailer>("Mailer").unwrap();
    assert_eq!(mailer.transport.name(), "null");
    assert_eq!(
        container.class_map().get("Transport").map(String::as_str),
        Some("NullTransport")
    );
}

#[test]
fn test_provider_never_overrides_explicit_bind() {
    let mut container = container(&BuildLog::default());
    container.bind(bindings! { "Transport" => "SmtpTransport" });
    container.add_provider("Mailer", TransportBinding("NullTransport"));
    assert_eq!(container.get::<Mailer>("Mailer").unwrap().transport.name(), "smtp");

    let mut container = Container::new(common::registry(&BuildLog::default()));
    container.add_provider("Mailer", TransportBinding("NullTransport"));
    container.bind(bindings! { "Transport" => "SmtpTransport" });
    assert_eq!(container.get::<Mailer>("Mailer").unwrap().transport.name(), "smtp");
}

#[test]
fn test_interface_provider_applies_to_implementation() {
    let log = BuildLog::default();
    let mut container = container(&log);
    container.add_provider(
        "Transport",
        Auditing {
            log: log.clone(),
            binding: Some("SmtpTransport"),
        },
    );

    container.get_instance("Mailer").unwrap();

    assert_eq!(log.count("finalized"), 1);
    let transport_at = log.position("SmtpTransport").unwrap();
    assert_eq!(log.position("finalized"), Some(transport_at + 1));
}

#[test]
fn test_finalizer_runs_before_caching() {
    let log = BuildLog::default();
    let mut container = container(&log);
    container.add_provider(
        "Clock",
        Auditing {
            log: log.clone(),
            binding: None,
        },
    );

    container.get_instance("Clock").unwrap();
    container.get_instance("Clock").unwrap();

    assert_eq!(log.entries(), vec!["Clock".to_string(), "finalized".to_string()]);
}

#[test]
fn test_failing_finalizer_caches_nothing() {
    struct Rejecting;

    impl Provider for Rejecting {
        fn finalizer(&self) -> Option<Finalizer> {
            Some(Arc::new(|_: &Instance| -> ioc_graph::Result<()> {
                Err(ContainerError::other("rejected"))
            }))
        }
    }

    let mut container = container(&BuildLog::default());
    container.add_provider("Clock", Rejecting);

    let err = container.get_instance("Clock").unwrap_err();
    assert!(matches!(err, ContainerError::ConstructionFailed { ref class, .. } if class == "Clock"));
    assert!(!container.has("Clock"));
}

/// Builds `Mailer` itself from the resolved transport.
struct MailerFactory;

impl Provider for MailerFactory {
    fn arguments(&self, _consumer: &str, _services: &ServiceView<'_>) -> Arguments {
        Arguments::new().with("sender", String::from("factory@example.com"))
    }

    fn factory(&self) -> Option<Factory> {
        Some(Arc::new(|services: &ServiceView<'_>, arguments: &Arguments| -> ioc_graph::Result<Instance> {
            assert!(services.has("NullTransport"));
            let mailer = Mailer {
                transport: arguments.get_as::<dyn Transport>("transport")?,
                sender: format!("{} (factory)", arguments.value::<String>("sender")?),
            };
            Ok(Arc::new(mailer) as Instance)
        }))
    }
}

#[test]
fn test_factory_replaces_constructor() {
    let log = BuildLog::default();
    let mut container = container(&log);
    container.bind(bindings! { "Transport" => "NullTransport" });
    container.add_provider("Mailer", MailerFactory);

    let mailer = container.get::<Mailer>("Mailer").unwrap();

    assert_eq!(mailer.sender, "factory@example.com (factory)");
    assert_eq!(mailer.transport.name(), "null");
    assert_eq!(log.count("Mailer"), 0);
}

#[test]
fn test_definition_supplies_scalar() {
    let mut container = container(&BuildLog::default());
    container.bind(bindings! { "Transport" => "SmtpTransport" });
    container
        .add_definition(Definition::new(
            "Mailer",
            Arguments::new().with("sender", String::from("noreply@example.com")),
        ))
        .unwrap();

    let mailer = container.get::<Mailer>("Mailer").unwrap();
    assert_eq!(mailer.sender, "noreply@example.com");
}

struct ConfiguredTransport;

impl Provider for ConfiguredTransport {
    fn bindings(&self) -> Bindings {
        bindings! { "Transport" => "NullTransport" }
    }
}

#[test]
fn test_provider_class_is_built_by_container() {
    let log = BuildLog::default();
    let mut container = container(&log);
    container
        .register(
            TypeManifest::class("ConfiguredTransport")
                .constructor(|_| Ok(ConfiguredTransport))
                .implements::<ConfiguredTransport, dyn Provider>(PROVIDER_INTERFACE, |p| {
                    p as Arc<dyn Provider>
                }),
        )
        .unwrap();

    container
        .add_provider_class("Mailer", "ConfiguredTransport")
        .unwrap();

    assert!(container.has("ConfiguredTransport"));
    let mailer = container.get::<Mailer>("Mailer").unwrap();
    assert_eq!(mailer.transport.name(), "null");
}

#[test]
fn test_provider_class_must_implement_provider() {
    let mut container = container(&BuildLog::default());
    let err = container.add_provider_class("Mailer", "Clock").unwrap_err();
    assert!(matches!(
        err,
        ContainerError::NotAnImplementation { ref class, ref interface }
            if class == "Clock" && interface == PROVIDER_INTERFACE
    ));
}

#[test]
fn test_stale_cached_leaf_is_rebuilt_after_reset() {
    let log = BuildLog::default();
    let mut container = container(&log);
    container.bind(bindings! { "Transport" => "SmtpTransport" });

    // Mailer is cached before Newsletter is resolved, so it is recorded as a leaf.
    container.get_instance("Mailer").unwrap();
    container.get_instance("Newsletter").unwrap();
    let map = container.dependency_map("Newsletter").unwrap();
    assert!(map.dependencies_of("Mailer").unwrap().is_empty());

    container.soft_reset();
    let newsletter = container.get::<Newsletter>("Newsletter").unwrap();

    assert_eq!(newsletter.mailer.transport.name(), "smtp");
    assert_eq!(log.count("SmtpTransport"), 2);
    assert_eq!(log.count("Mailer"), 2);
    // The memoized map itself is untouched.
    let map = container.dependency_map("Newsletter").unwrap();
    assert!(map.dependencies_of("Mailer").unwrap().is_empty());
}
