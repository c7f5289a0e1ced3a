//! 容器门面
//!
//! 持有一个容器的全部存储：类型描述、绑定、提供者、记忆的依赖图和单例缓存。
//! 依赖图的展开与构建交给 `DependencyResolver` 和 `Compiler`。

mod shared;
mod stats;

pub use shared::SharedContainer;
pub use stats::ContainerStats;

use super::binding::{BindingTable, Bindings};
use super::compiler::{CompileContext, Compiler};
use super::inspector::TypeInspector;
use super::instance::InstanceCache;
use super::manifest::{Instance, TypeManifest, TypeRegistry};
use super::module::Module;
use super::provider::{ArgumentsProvider, Provider, ProviderRegistry, PROVIDER_INTERFACE};
use super::resolver::{DependencyMap, DependencyResolver, ResolveContext};
use crate::config::{ContainerConfig, Definition};
use crate::errors::{ContainerError, Result};
use crate::logging::OperationTimer;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// 控制反转容器
#[derive(Debug)]
pub struct Container {
    inspector: TypeInspector,
    bindings: BindingTable,
    providers: ProviderRegistry,
    resolver: DependencyResolver,
    compiler: Compiler,
    instances: InstanceCache,
    stats: ContainerStats,
}

impl Default for Container {
    fn default() -> Self {
        Self::new(TypeRegistry::new())
    }
}

impl Container {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            inspector: TypeInspector::new(registry),
            bindings: BindingTable::new(),
            providers: ProviderRegistry::new(),
            resolver: DependencyResolver::new(),
            compiler: Compiler::new(),
            instances: InstanceCache::new(),
            stats: ContainerStats::default(),
        }
    }

    /// 创建容器并应用 `config`：依次为提供者、绑定、定义
    pub fn with_config(registry: TypeRegistry, config: ContainerConfig) -> Result<Self> {
        let mut container = Self::new(registry);
        container.add_providers(config.providers);
        container.bind(config.bindings);
        for definition in config.definitions {
            container.add_definition(definition)?;
        }
        tracing::info!(
            types = container.inspector.registry().len(),
            bindings = container.bindings.len(),
            providers = container.providers.len(),
            "container configured"
        );
        Ok(container)
    }

    /// 注册类型清单，并使引用该类型的缓存描述和依赖图失效
    pub fn register(&mut self, manifest: TypeManifest) -> Result<&mut Self> {
        let stale = self.inspector.register(manifest)?;
        self.resolver.forget_involving(&stale);
        Ok(self)
    }

    /// 获取 `id` 的单例实例，首次使用时创建它及其整个依赖图
    ///
    /// `id` 可以是接口名，此时创建其绑定的类
    pub fn get_instance(&mut self, id: &str) -> Result<Instance> {
        self.stats.total_resolutions += 1;
        if let Some(instance) = self.instances.get(id) {
            self.stats.cache_hits += 1;
            return Ok(instance);
        }

        let class = self.concrete_name(id)?;
        if let Some(instance) = self.instances.get(&class) {
            self.stats.cache_hits += 1;
            return Ok(instance);
        }

        self.stats.cache_misses += 1;
        self.make(&class)
    }

    /// 带类型的 `get_instance`
    pub fn get<T: Any + Send + Sync>(&mut self, id: &str) -> Result<Arc<T>> {
        self.get_instance(id)?
            .downcast::<T>()
            .map_err(|_| ContainerError::InstanceTypeMismatch {
                name: id.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// 以 `Arc<I>` 返回接口 `id` 绑定的实例
    pub fn get_as<I: ?Sized + Send + Sync + 'static>(&mut self, id: &str) -> Result<Arc<I>> {
        let instance = self.get_instance(id)?;
        let mismatch = || ContainerError::InstanceTypeMismatch {
            name: id.to_string(),
            expected: std::any::type_name::<I>(),
        };

        if let Some(handle) = instance.downcast_ref::<Arc<I>>() {
            return Ok(Arc::clone(handle));
        }
        if !self.inspector.is_interface(id) {
            return Err(mismatch());
        }

        let class = self.concrete_name(id)?;
        let handle = self.inspector.manifest(&class)?.upcast(id, &instance)?;
        handle
            .downcast_ref::<Arc<I>>()
            .map(Arc::clone)
            .ok_or_else(mismatch)
    }

    /// 仅检查缓存，不做解析
    pub fn has(&self, id: &str) -> bool {
        self.instances.has(id)
    }

    /// 以值自身的注册类型名缓存 `value`
    ///
    /// 没有清单声明其 Rust 类型的值以 `std::any::type_name` 为键，
    /// 仅从外部注入的类型请用 `TypeManifest::external` 声明。
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) -> &mut Self {
        let name = self
            .inspector
            .registry()
            .name_of(TypeId::of::<T>())
            .map(str::to_string)
            .unwrap_or_else(|| std::any::type_name::<T>().to_string());
        self.set_instance(name, Arc::new(value))
    }

    pub fn set_named<T: Any + Send + Sync>(&mut self, id: impl Into<String>, value: T) -> &mut Self {
        self.set_instance(id, Arc::new(value))
    }

    pub fn set_instance(&mut self, id: impl Into<String>, instance: Instance) -> &mut Self {
        let id = id.into();
        tracing::debug!(id = %id, "caching externally built instance");
        self.instances.insert(id, instance);
        self
    }

    /// 合并绑定，同一接口后绑定的优先
    pub fn bind<I, K, V>(&mut self, bindings: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.bindings.bind(bindings);
        self
    }

    pub fn class_map(&self) -> &Bindings {
        self.bindings.as_map()
    }

    pub fn add_provider(&mut self, key: impl Into<String>, provider: impl Provider + 'static) -> &mut Self {
        self.add_shared_provider(key, Arc::new(provider))
    }

    /// 注册提供者并立即记录其声明的绑定，不覆盖显式绑定
    pub fn add_shared_provider(&mut self, key: impl Into<String>, provider: Arc<dyn Provider>) -> &mut Self {
        let key = key.into();
        let declared = provider.bindings();
        self.providers.add(key.clone(), provider);
        self.bindings.fill_all(&declared);

        if let Some(class) = declared.get(&key) {
            let bound = self.bindings.get(&key).unwrap_or(class.as_str()).to_string();
            self.providers.share(&key, &bound);
        }
        tracing::debug!(key = %key, bindings = declared.len(), "registered provider");
        self
    }

    pub fn add_providers<I, K>(&mut self, providers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Arc<dyn Provider>)>,
        K: Into<String>,
    {
        for (key, provider) in providers {
            self.add_shared_provider(key, provider);
        }
        self
    }

    /// 由容器创建 `class`，并注册为 `key` 的提供者
    pub fn add_provider_class(&mut self, key: impl Into<String>, class: &str) -> Result<&mut Self> {
        let instance = self.get_instance(class)?;
        let handle = self
            .inspector
            .manifest(class)?
            .upcast(PROVIDER_INTERFACE, &instance)?;
        let provider = handle
            .downcast_ref::<Arc<dyn Provider>>()
            .map(Arc::clone)
            .ok_or_else(|| ContainerError::NotAnImplementation {
                class: class.to_string(),
                interface: PROVIDER_INTERFACE.to_string(),
            })?;
        Ok(self.add_shared_provider(key, provider))
    }

    /// 为类注册固定的构造参数
    pub fn add_definition(&mut self, definition: Definition) -> Result<&mut Self> {
        self.inspector.manifest(&definition.class)?;
        let provider = ArgumentsProvider::new(definition.arguments);
        Ok(self.add_provider(definition.class, provider))
    }

    /// 依次注册模块的类型、提供者和绑定
    pub fn install(&mut self, module: &dyn Module) -> Result<&mut Self> {
        for manifest in module.types() {
            self.register(manifest)?;
        }
        self.add_providers(module.providers());
        self.bind(module.bindings());
        tracing::info!(module = module.name(), "installed module");
        Ok(self)
    }

    /// 清空实例缓存，绑定、提供者和记忆的依赖图保留
    pub fn soft_reset(&mut self) -> &mut Self {
        let dropped = self.instances.len();
        self.instances.clear();
        self.stats.soft_resets += 1;
        tracing::debug!(dropped, "soft reset");
        self
    }

    /// 对每个已缓存且标记重置的实例调用重置能力
    ///
    /// 先校验全部目标再重置，失败时不重置任何实例
    pub fn selective_reset(&mut self) -> Result<&mut Self> {
        let marked: Vec<&str> = self
            .inspector
            .registry()
            .manifests()
            .filter(|manifest| manifest.is_reset_marked())
            .map(TypeManifest::name)
            .collect();

        let mut targets = Vec::new();
        for name in marked {
            let Some(instance) = self.instances.get(name) else {
                continue;
            };
            let hook = self
                .inspector
                .manifest(name)?
                .reset_hook()
                .filter(|hook| hook.supports(&instance))
                .cloned()
                .ok_or_else(|| ContainerError::ResetNotSupported(name.to_string()))?;
            targets.push((name.to_string(), hook, instance));
        }

        for (name, hook, instance) in &targets {
            hook.apply(instance);
            tracing::debug!(class = %name, "reset instance");
        }
        self.stats.selective_resets += 1;
        Ok(self)
    }

    /// 根类型已解析时返回其记忆的依赖图
    pub fn dependency_map(&self, id: &str) -> Option<Arc<DependencyMap>> {
        self.resolver.memoized(id)
    }

    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.instances.names()
    }

    pub fn stats(&self) -> &ContainerStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ContainerStats::default();
    }

    fn concrete_name(&mut self, id: &str) -> Result<String> {
        if !self.inspector.is_interface(id) {
            return Ok(id.to_string());
        }
        let mut ctx = ResolveContext {
            inspector: &mut self.inspector,
            bindings: &mut self.bindings,
            providers: &mut self.providers,
            instances: &self.instances,
        };
        ctx.bind_interface(id, None)
    }

    fn make(&mut self, class: &str) -> Result<Instance> {
        let timer = OperationTimer::new("compile").with_metadata("type", class);

        let memoized = self.resolver.is_memoized(class);
        let plan = {
            let mut ctx = ResolveContext {
                inspector: &mut self.inspector,
                bindings: &mut self.bindings,
                providers: &mut self.providers,
                instances: &self.instances,
            };
            let map = self.resolver.resolve(class, &mut ctx)?;
            self.resolver.refresh(map, &mut ctx)?
        };
        if memoized {
            self.stats.memo_hits += 1;
        } else {
            self.stats.fresh_resolutions += 1;
        }

        let built = {
            let mut ctx = CompileContext {
                inspector: &mut self.inspector,
                bindings: &self.bindings,
                providers: &self.providers,
                instances: &mut self.instances,
            };
            self.compiler.compile(class, &plan, &mut ctx)?
        };
        self.stats.instances_built += built.len() as u64;
        timer.finish();

        self.instances
            .get(class)
            .ok_or_else(|| ContainerError::InstanceNotFound(class.to_string()))
    }
}
