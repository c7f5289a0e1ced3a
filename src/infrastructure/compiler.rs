//! 依赖图编译
//!
//! 按逆拓扑序创建根类型及其全部依赖。实例先暂存，整次调用的所有类型
//! 都构造成功后才提交到缓存，失败时不会留下半个依赖图。

use super::binding::BindingTable;
use super::inspector::TypeInspector;
use super::instance::InstanceCache;
use super::manifest::{Arguments, Instance};
use super::provider::{ProviderRegistry, ServiceView};
use super::resolver::DependencyMap;
use crate::errors::{ContainerError, Result};
use indexmap::IndexSet;
use std::sync::Arc;

/// 编译器读取并填充的容器状态
pub struct CompileContext<'a> {
    pub inspector: &'a mut TypeInspector,
    pub bindings: &'a BindingTable,
    pub providers: &'a ProviderRegistry,
    pub instances: &'a mut InstanceCache,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// 实例化 `root` 及其依赖，返回本次调用创建的类型名
    pub fn compile(
        &self,
        root: &str,
        map: &DependencyMap,
        ctx: &mut CompileContext<'_>,
    ) -> Result<Vec<String>> {
        let order = construction_order(root, map)?;
        let mut staged = InstanceCache::new();
        let mut built = Vec::new();

        for class in order {
            if ctx.instances.has(&class) || staged.has(&class) {
                continue;
            }
            let instance = self.build(&class, map, ctx, &staged)?;
            staged.insert(class.clone(), instance);
            built.push(class);
        }

        ctx.instances.commit(staged);
        Ok(built)
    }

    fn build(
        &self,
        class: &str,
        map: &DependencyMap,
        ctx: &mut CompileContext<'_>,
        staged: &InstanceCache,
    ) -> Result<Instance> {
        let descriptor = ctx.inspector.describe(class)?;
        if descriptor.is_interface() {
            return Err(ContainerError::NotConstructible(class.to_string()));
        }

        let provider = ctx.providers.get(class);
        let view = ServiceView::new(&*ctx.instances, ctx.bindings).with_staged(staged);
        let provided = provider
            .as_ref()
            .map(|provider| provider.arguments(class, &view))
            .unwrap_or_default();

        let mut arguments = Arguments::new();
        for param in &descriptor.parameters {
            if let Some(value) = provided.instance(&param.name) {
                arguments.insert_instance(param.name.clone(), Arc::clone(value));
                continue;
            }
            let Some(dependency) = map.dependency(class, &param.name) else {
                continue;
            };
            let instance =
                view.instance(dependency)
                    .ok_or_else(|| ContainerError::InconsistentGraph {
                        consumer: class.to_string(),
                        dependency: dependency.to_string(),
                    })?;
            let value = match param.declared_type.as_deref() {
                Some(interface) if param.is_interface() => ctx
                    .inspector
                    .manifest(dependency)?
                    .upcast(interface, &instance)?,
                _ => instance,
            };
            arguments.insert_instance(param.name.clone(), value);
        }
        arguments.merge_missing(&provided);

        let instance = match provider.as_ref().and_then(|provider| provider.factory()) {
            Some(factory) => factory(&view, &arguments),
            None => ctx.inspector.manifest(class)?.construct(&arguments),
        }
        .map_err(|err| ContainerError::construction(class, err))?;

        if let Some(finalizer) = provider.as_ref().and_then(|provider| provider.finalizer()) {
            finalizer(&instance).map_err(|err| ContainerError::construction(class, err))?;
        }

        tracing::debug!(class = %class, arguments = arguments.len(), "constructed instance");
        Ok(instance)
    }
}

/// 从 `root` 后序遍历 `map`：依赖总在消费者之前
pub fn construction_order(root: &str, map: &DependencyMap) -> Result<Vec<String>> {
    fn visit(
        class: &str,
        map: &DependencyMap,
        visiting: &mut Vec<String>,
        done: &mut IndexSet<String>,
    ) -> Result<()> {
        if done.contains(class) {
            return Ok(());
        }
        if visiting.iter().any(|pending| pending == class) {
            let consumer = visiting.last().cloned().unwrap_or_default();
            return Err(ContainerError::CircularReference {
                consumer,
                dependency: class.to_string(),
            });
        }

        visiting.push(class.to_string());
        if let Some(deps) = map.dependencies_of(class) {
            for dependency in deps.values() {
                visit(dependency, map, visiting, done)?;
            }
        }
        visiting.pop();
        done.insert(class.to_string());
        Ok(())
    }

    let mut done = IndexSet::new();
    visit(root, map, &mut Vec::new(), &mut done)?;
    Ok(done.into_iter().collect())
}
