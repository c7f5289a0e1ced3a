use super::{Container, ContainerStats};
use crate::errors::Result;
use crate::infrastructure::manifest::Instance;
use crate::infrastructure::provider::Provider;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

/// 线程安全的容器句柄
///
/// 一把锁保护全部存储，每次调用在整个操作期间持有锁，
/// `get` 不会看到构建到一半的依赖图或并发的绑定
#[derive(Clone, Default)]
pub struct SharedContainer {
    inner: Arc<Mutex<Container>>,
}

impl SharedContainer {
    pub fn new(container: Container) -> Self {
        Self {
            inner: Arc::new(Mutex::new(container)),
        }
    }

    pub fn get_instance(&self, id: &str) -> Result<Instance> {
        self.inner.lock().get_instance(id)
    }

    pub fn get<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
        self.inner.lock().get::<T>(id)
    }

    pub fn get_as<I: ?Sized + Send + Sync + 'static>(&self, id: &str) -> Result<Arc<I>> {
        self.inner.lock().get_as::<I>(id)
    }

    pub fn has(&self, id: &str) -> bool {
        self.inner.lock().has(id)
    }

    pub fn set<T: Any + Send + Sync>(&self, value: T) {
        self.inner.lock().set(value);
    }

    pub fn bind<I, K, V>(&self, bindings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.lock().bind(bindings);
    }

    pub fn add_provider(&self, key: impl Into<String>, provider: impl Provider + 'static) {
        self.inner.lock().add_provider(key, provider);
    }

    pub fn soft_reset(&self) {
        self.inner.lock().soft_reset();
    }

    pub fn selective_reset(&self) -> Result<()> {
        self.inner.lock().selective_reset().map(|_| ())
    }

    pub fn stats(&self) -> ContainerStats {
        self.inner.lock().stats().clone()
    }

    /// 独占容器执行 `f`
    pub fn with<R>(&self, f: impl FnOnce(&mut Container) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}

impl From<Container> for SharedContainer {
    fn from(container: Container) -> Self {
        Self::new(container)
    }
}

impl std::fmt::Debug for SharedContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(container) => f.debug_tuple("SharedContainer").field(&*container).finish(),
            None => f.write_str("SharedContainer(<locked>)"),
        }
    }
}
