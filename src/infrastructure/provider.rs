//! 服务提供者
//!
//! 提供者定制某个消费者（或某接口所有实现）的构建方式：
//! - 跳过依赖图展开的具名构造参数
//! - 仅对该消费者生效的接口绑定
//! - 替代构造函数的工厂
//! - 实例缓存前执行的收尾钩子

use super::binding::{BindingTable, Bindings};
use super::instance::InstanceCache;
use super::manifest::{Arguments, Instance};
use crate::errors::{ContainerError, Result};
use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;

/// 提供者类声明 `dyn Provider` 时使用的接口名
pub const PROVIDER_INTERFACE: &str = "Provider";

/// 代替类型构造函数创建实例
pub type Factory = Arc<dyn Fn(&ServiceView<'_>, &Arguments) -> Result<Instance> + Send + Sync>;

/// 构造后钩子
pub type Finalizer = Arc<dyn Fn(&Instance) -> Result<()> + Send + Sync>;

/// 交给提供者的只读容器视图
pub struct ServiceView<'a> {
    instances: &'a InstanceCache,
    staged: Option<&'a InstanceCache>,
    bindings: &'a BindingTable,
}

impl<'a> ServiceView<'a> {
    pub fn new(instances: &'a InstanceCache, bindings: &'a BindingTable) -> Self {
        Self {
            instances,
            staged: None,
            bindings,
        }
    }

    /// 同时暴露本次编译中已创建的实例
    pub fn with_staged(mut self, staged: &'a InstanceCache) -> Self {
        self.staged = Some(staged);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.instances.has(name) || self.staged.is_some_and(|staged| staged.has(name))
    }

    pub fn instance(&self, name: &str) -> Option<Instance> {
        self.instances
            .get(name)
            .or_else(|| self.staged.and_then(|staged| staged.get(name)))
    }

    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self
            .instance(name)
            .ok_or_else(|| ContainerError::InstanceNotFound(name.to_string()))?;
        instance
            .downcast::<T>()
            .map_err(|_| ContainerError::InstanceTypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn binding(&self, interface: &str) -> Option<&str> {
        self.bindings.get(interface)
    }
}

/// 针对消费者或接口注册的构建定制
///
/// `arguments` 和 `bindings` 可能被多次调用，不能有副作用；
/// `factory` 和 `finalizer` 可以有
pub trait Provider: Send + Sync {
    /// `consumer` 的具名构造参数
    fn arguments(&self, _consumer: &str, _services: &ServiceView<'_>) -> Arguments {
        Arguments::new()
    }

    fn bindings(&self) -> Bindings {
        Bindings::new()
    }

    fn factory(&self) -> Option<Factory> {
        None
    }

    fn finalizer(&self) -> Option<Finalizer> {
        None
    }
}

/// 提供固定参数的提供者，用于定义
#[derive(Debug, Clone, Default)]
pub struct ArgumentsProvider {
    arguments: Arguments,
}

impl ArgumentsProvider {
    pub fn new(arguments: Arguments) -> Self {
        Self { arguments }
    }
}

impl Provider for ArgumentsProvider {
    fn arguments(&self, _consumer: &str, _services: &ServiceView<'_>) -> Arguments {
        self.arguments.clone()
    }
}

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册提供者，覆盖同名的旧提供者
    pub fn add(&mut self, key: impl Into<String>, provider: Arc<dyn Provider>) {
        let key = key.into();
        if self.providers.insert(key.clone(), provider).is_some() {
            tracing::warn!(key = %key, "replaced previously registered provider");
        }
    }

    /// 把 `from` 的提供者共享给 `to`（`to` 已有提供者时跳过）
    pub fn share(&mut self, from: &str, to: &str) {
        if self.providers.contains_key(to) {
            return;
        }
        if let Some(provider) = self.providers.get(from).cloned() {
            tracing::debug!(interface = %from, class = %to, "shared interface provider with implementation");
            self.providers.insert(to.to_string(), provider);
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.providers.keys()).finish()
    }
}
