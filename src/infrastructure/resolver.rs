//! 依赖解析
//!
//! 深度优先展开根类型的构造参数，生成 `DependencyMap`，不创建任何实例。
//! 接口通过绑定表和提供者映射到类。每条新边都会与当前展开中
//! 尚未完成的类型比对，以检测循环依赖。

use super::binding::BindingTable;
use super::inspector::TypeInspector;
use super::instance::InstanceCache;
use super::manifest::Arguments;
use super::provider::{ProviderRegistry, ServiceView};
use crate::errors::{ContainerError, Result};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// 消费者类型 -> (参数名 -> 依赖类型)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    edges: IndexMap<String, IndexMap<String, String>>,
    cached_leaves: IndexSet<String>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录无边的类型，已记录的边保留
    pub fn record_leaf(&mut self, class: &str) {
        self.edges.entry(class.to_string()).or_default();
    }

    /// 记录仅因实例已缓存而成为叶子的类型
    pub fn record_cached_leaf(&mut self, class: &str) {
        self.record_leaf(class);
        self.cached_leaves.insert(class.to_string());
    }

    pub fn record_edge(&mut self, consumer: &str, parameter: &str, dependency: &str) {
        self.edges
            .entry(consumer.to_string())
            .or_default()
            .insert(parameter.to_string(), dependency.to_string());
    }

    pub fn contains(&self, class: &str) -> bool {
        self.edges.contains_key(class)
    }

    /// `from` 是否直接依赖 `to`
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .get(from)
            .is_some_and(|deps| deps.values().any(|dep| dep == to))
    }

    pub fn dependency(&self, consumer: &str, parameter: &str) -> Option<&str> {
        self.edges
            .get(consumer)
            .and_then(|deps| deps.get(parameter))
            .map(String::as_str)
    }

    pub fn dependencies_of(&self, consumer: &str) -> Option<&IndexMap<String, String>> {
        self.edges.get(consumer)
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(IndexMap::len).sum()
    }

    pub fn as_map(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.edges
    }

    /// 实例已不在 `instances` 中的缓存叶子
    pub fn stale_leaves<'m>(&'m self, instances: &'m InstanceCache) -> impl Iterator<Item = &'m str> {
        self.cached_leaves
            .iter()
            .map(String::as_str)
            .filter(move |class| !instances.has(class))
    }

    /// 删除类型条目，以便重新展开
    fn forget(&mut self, class: &str) {
        self.edges.shift_remove(class);
        self.cached_leaves.shift_remove(class);
    }

    /// 加入 `other` 中尚不存在的类型条目
    fn merge_missing(&mut self, other: &DependencyMap) {
        for (class, deps) in &other.edges {
            if !self.edges.contains_key(class) {
                self.edges.insert(class.clone(), deps.clone());
                if other.cached_leaves.contains(class) {
                    self.cached_leaves.insert(class.clone());
                }
            }
        }
    }
}

/// 解析器读取并更新的容器状态
pub struct ResolveContext<'a> {
    pub inspector: &'a mut TypeInspector,
    pub bindings: &'a mut BindingTable,
    pub providers: &'a mut ProviderRegistry,
    pub instances: &'a InstanceCache,
}

impl ResolveContext<'_> {
    fn provided_arguments(&self, class: &str) -> Option<Arguments> {
        let provider = self.providers.get(class)?;
        let view = ServiceView::new(self.instances, &*self.bindings);
        Some(provider.arguments(class, &view))
    }

    /// 把接口映射到类：先查显式绑定，再查消费者的提供者，最后查接口自身的提供者
    pub fn bind_interface(&mut self, interface: &str, consumer: Option<&str>) -> Result<String> {
        if let Some(class) = self.bindings.get(interface) {
            return Ok(class.to_string());
        }

        if let Some(provider) = consumer.and_then(|consumer| self.providers.get(consumer)) {
            let scoped = provider.bindings();
            if let Some(class) = scoped.get(interface) {
                return Ok(self.bindings.fill(interface, class).to_string());
            }
        }

        if let Some(provider) = self.providers.get(interface) {
            let declared = provider.bindings();
            if let Some(class) = declared.get(interface) {
                let bound = self.bindings.fill(interface, class).to_string();
                self.providers.share(interface, &bound);
                return Ok(bound);
            }
        }

        Err(ContainerError::InterfaceBindingNotFound {
            interface: interface.to_string(),
            consumer: consumer.map(str::to_string),
        })
    }
}

/// 解析根类型并记忆其依赖图
#[derive(Debug, Default)]
pub struct DependencyResolver {
    memo: HashMap<String, Arc<DependencyMap>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memoized(&self, root: &str) -> Option<Arc<DependencyMap>> {
        self.memo.get(root).cloned()
    }

    pub fn is_memoized(&self, root: &str) -> bool {
        self.memo.contains_key(root)
    }

    /// 丢弃包含 `types` 中任一类型的记忆依赖图
    pub fn forget_involving(&mut self, types: &[String]) {
        if types.is_empty() {
            return;
        }
        self.memo.retain(|root, map| {
            let keep = !types.iter().any(|class| map.contains(class));
            if !keep {
                tracing::debug!(root = %root, "dropped memoized dependency map");
            }
            keep
        });
    }

    pub fn resolve(&mut self, root: &str, ctx: &mut ResolveContext<'_>) -> Result<Arc<DependencyMap>> {
        if let Some(map) = self.memo.get(root) {
            tracing::debug!(root = %root, "reusing memoized dependency map");
            return Ok(Arc::clone(map));
        }

        let mut expansion = Expansion {
            ctx,
            map: DependencyMap::new(),
            pending: Vec::new(),
        };
        expansion.expand(root)?;

        let map = Arc::new(expansion.map);
        tracing::debug!(
            root = %root,
            types = map.edges.len(),
            edges = map.edge_count(),
            "resolved dependency map"
        );
        self.memo.insert(root.to_string(), Arc::clone(&map));
        Ok(map)
    }

    /// 返回 `map` 对应的编译计划，重新展开解析时仅因已缓存而记录的叶子
    ///
    /// 记忆的依赖图从不修改，刷新后的计划是私有副本
    pub fn refresh(
        &mut self,
        map: Arc<DependencyMap>,
        ctx: &mut ResolveContext<'_>,
    ) -> Result<Arc<DependencyMap>> {
        if map.stale_leaves(ctx.instances).next().is_none() {
            return Ok(map);
        }

        let mut plan = (*map).clone();
        let mut refreshed: HashSet<String> = HashSet::new();
        loop {
            let stale: Vec<String> = plan
                .stale_leaves(ctx.instances)
                .filter(|class| !refreshed.contains(*class))
                .map(str::to_string)
                .collect();
            if stale.is_empty() {
                break;
            }
            for class in stale {
                tracing::debug!(class = %class, "re-expanding stale cached leaf");
                plan.forget(&class);
                let sub = self.resolve(&class, ctx)?;
                plan.merge_missing(&sub);
                refreshed.insert(class);
            }
        }
        Ok(Arc::new(plan))
    }
}

struct Expansion<'c, 'a> {
    ctx: &'c mut ResolveContext<'a>,
    map: DependencyMap,
    pending: Vec<String>,
}

impl Expansion<'_, '_> {
    fn expand(&mut self, class: &str) -> Result<()> {
        let descriptor = self.ctx.inspector.describe(class)?;

        if self.ctx.instances.has(class) {
            self.map.record_cached_leaf(class);
            return Ok(());
        }
        if descriptor.is_interface() {
            return Err(ContainerError::NotConstructible(class.to_string()));
        }
        if !descriptor.has_constructor() {
            self.map.record_leaf(class);
            return Ok(());
        }

        let provided = self.ctx.provided_arguments(class);
        if let Some(arguments) = &provided {
            if arguments.len() == descriptor.parameters.len() {
                tracing::debug!(class = %class, "provider supplies every constructor argument");
                self.map.record_leaf(class);
                return Ok(());
            }
        }

        self.map.record_leaf(class);
        self.pending.push(class.to_string());
        for param in &descriptor.parameters {
            if !param.is_inspectable() {
                continue;
            }
            if provided
                .as_ref()
                .is_some_and(|arguments| arguments.contains(&param.name))
            {
                continue;
            }
            let Some(declared) = param.declared_type.as_deref() else {
                continue;
            };
            let dependency = if param.is_interface() {
                self.ctx.bind_interface(declared, Some(class))?
            } else {
                declared.to_string()
            };
            self.record(class, &param.name, &dependency)?;
        }
        self.pending.pop();
        Ok(())
    }

    fn record(&mut self, consumer: &str, parameter: &str, dependency: &str) -> Result<()> {
        if self.map.has_edge(dependency, consumer) || self.pending.iter().any(|p| p == dependency) {
            return Err(ContainerError::CircularReference {
                consumer: consumer.to_string(),
                dependency: dependency.to_string(),
            });
        }

        self.map.record_edge(consumer, parameter, dependency);
        tracing::debug!(
            consumer = %consumer,
            parameter = %parameter,
            dependency = %dependency,
            "recorded dependency edge"
        );

        if !self.map.contains(dependency) {
            self.expand(dependency)?;
        }
        Ok(())
    }
}
