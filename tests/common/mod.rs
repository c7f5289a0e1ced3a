//! Shared fixtures: a small mail domain declared through manifests.

#![allow(dead_code)]

use ioc_graph::{Arguments, ContainerError, Resettable, TypeManifest, TypeRegistry};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Records constructor calls in order.
#[derive(Clone, Default)]
pub struct BuildLog(Arc<Mutex<Vec<String>>>);

impl BuildLog {
    pub fn record(&self, class: &str) {
        self.0.lock().push(class.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, class: &str) -> usize {
        self.0.lock().iter().filter(|entry| *entry == class).count()
    }

    pub fn position(&self, class: &str) -> Option<usize> {
        self.0.lock().iter().position(|entry| entry == class)
    }
}

pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;
}

pub struct SmtpTransport;

impl Transport for SmtpTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }
}

pub struct NullTransport;

impl Transport for NullTransport {
    fn name(&self) -> &'static str {
        "null"
    }
}

#[derive(Debug)]
pub struct Clock;

pub struct Mailer {
    pub transport: Arc<dyn Transport>,
    pub sender: String,
}

pub struct Newsletter {
    pub mailer: Arc<Mailer>,
    pub clock: Arc<Clock>,
}

#[derive(Debug)]
pub struct Endpoint {
    pub url: String,
}

#[derive(Debug)]
pub struct Gateway {
    pub endpoint: Arc<Endpoint>,
    pub clock: Arc<Clock>,
}

#[derive(Default)]
pub struct Counter {
    pub hits: AtomicUsize,
}

impl Counter {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Resettable for Counter {
    fn reset(&self) {
        self.hits.store(0, Ordering::SeqCst);
    }
}

pub struct Session;

/// Only ever built outside the container and handed in with `set`.
#[derive(Debug)]
pub struct MailSettings {
    pub footer: String,
}

#[derive(Debug)]
pub struct Digest {
    pub settings: Arc<MailSettings>,
    pub clock: Arc<Clock>,
}

pub const DEFAULT_SENDER: &str = "root@localhost";

/// Mail domain plus a few deliberately cyclic types.
pub fn registry(log: &BuildLog) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for manifest in manifests(log) {
        registry.register(manifest).unwrap();
    }
    registry
}

pub fn manifests(log: &BuildLog) -> Vec<TypeManifest> {
    let smtp = log.clone();
    let null = log.clone();
    let clock = log.clone();
    let mailer = log.clone();
    let newsletter = log.clone();
    let gateway = log.clone();
    let counter = log.clone();
    let digest = log.clone();

    vec![
        TypeManifest::interface("Transport"),
        TypeManifest::class("SmtpTransport")
            .constructor(move |_| {
                smtp.record("SmtpTransport");
                Ok(SmtpTransport)
            })
            .implements::<SmtpTransport, dyn Transport>("Transport", |t| t as Arc<dyn Transport>),
        TypeManifest::class("NullTransport")
            .constructor(move |_| {
                null.record("NullTransport");
                Ok(NullTransport)
            })
            .implements::<NullTransport, dyn Transport>("Transport", |t| t as Arc<dyn Transport>),
        TypeManifest::class("Clock").constructor(move |_| {
            clock.record("Clock");
            Ok(Clock)
        }),
        TypeManifest::class("Mailer")
            .param("transport", "Transport")
            .scalar("sender", "string")
            .constructor(move |args: &Arguments| {
                mailer.record("Mailer");
                Ok(Mailer {
                    transport: args.get_as::<dyn Transport>("transport")?,
                    sender: args
                        .value::<String>("sender")
                        .unwrap_or_else(|_| DEFAULT_SENDER.to_string()),
                })
            }),
        TypeManifest::class("Newsletter")
            .param("mailer", "Mailer")
            .param("clock", "Clock")
            .constructor(move |args: &Arguments| {
                newsletter.record("Newsletter");
                Ok(Newsletter {
                    mailer: args.get::<Mailer>("mailer")?,
                    clock: args.get::<Clock>("clock")?,
                })
            }),
        // `Endpoint` is never registered; only a provider can supply it.
        TypeManifest::class("Gateway")
            .param("endpoint", "Endpoint")
            .param("clock", "Clock")
            .constructor(move |args: &Arguments| {
                gateway.record("Gateway");
                Ok(Gateway {
                    endpoint: args.get::<Endpoint>("endpoint")?,
                    clock: args.get::<Clock>("clock")?,
                })
            }),
        TypeManifest::class("Counter")
            .constructor(move |_| {
                counter.record("Counter");
                Ok(Counter::default())
            })
            .resettable::<Counter>(),
        TypeManifest::external::<MailSettings>("MailSettings"),
        TypeManifest::class("Digest")
            .param("settings", "MailSettings")
            .param("clock", "Clock")
            .constructor(move |args: &Arguments| {
                digest.record("Digest");
                Ok(Digest {
                    settings: args.get::<MailSettings>("settings")?,
                    clock: args.get::<Clock>("clock")?,
                })
            }),
        TypeManifest::class("Session")
            .constructor(|_| Ok(Session))
            .reset_marker(),
        TypeManifest::class("Flaky")
            .param("clock", "Clock")
            .constructor(|_: &Arguments| -> ioc_graph::Result<Clock> {
                Err(ContainerError::other("flaky constructor"))
            }),
        TypeManifest::class("Chicken").param("egg", "Egg"),
        TypeManifest::class("Egg").param("chicken", "Chicken"),
        TypeManifest::class("Rock").param("paper", "Paper"),
        TypeManifest::class("Paper").param("scissors", "Scissors"),
        TypeManifest::class("Scissors").param("rock", "Rock"),
        TypeManifest::class("Ouroboros").param("tail", "Ouroboros"),
    ]
}
