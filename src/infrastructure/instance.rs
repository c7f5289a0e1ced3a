//! 单例实例缓存

use super::manifest::Instance;
use indexmap::IndexMap;
use std::sync::Arc;

/// 按类型名存放已创建的实例
#[derive(Clone, Default)]
pub struct InstanceCache {
    instances: IndexMap<String, Instance>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Instance> {
        self.instances.get(name).map(Arc::clone)
    }

    /// 存入实例，覆盖旧实例
    pub fn insert(&mut self, name: impl Into<String>, instance: Instance) {
        self.instances.insert(name.into(), instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// 把 `staged` 中的全部实例移入本缓存
    pub fn commit(&mut self, staged: InstanceCache) {
        self.instances.extend(staged.instances);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.instances.keys()).finish()
    }
}
