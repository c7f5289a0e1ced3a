//! 类型检查
//!
//! 把已注册的清单转换为缓存的 `TypeDescriptor`。只有声明类型为已注册
//! 类或接口的参数才可检查；标量、枚举、无类型和未知类型交给提供者。

use super::manifest::{ParamType, TypeKind, TypeManifest, TypeRegistry};
use crate::errors::{ContainerError, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Concrete,
    Interface,
    NotInspectable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: String,
    pub declared_type: Option<String>,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    pub fn is_inspectable(&self) -> bool {
        self.kind != ParamKind::NotInspectable
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ParamKind::Interface
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    pub parameters: Vec<ParamDescriptor>,
    pub reset_marker: bool,
}

impl TypeDescriptor {
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Abstract
    }

    /// 没有声明参数的类型以空参数构建
    pub fn has_constructor(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// 持有一个容器的类型清单和描述缓存
#[derive(Debug, Default)]
pub struct TypeInspector {
    registry: TypeRegistry,
    descriptors: HashMap<String, Arc<TypeDescriptor>>,
}

impl TypeInspector {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            descriptors: HashMap::new(),
        }
    }

    /// 注册清单，并丢弃参数引用该新类型的已缓存描述
    ///
    /// 返回被丢弃描述的类型名
    pub fn register(&mut self, manifest: TypeManifest) -> Result<Vec<String>> {
        let name = manifest.name().to_string();
        self.registry.register(manifest)?;

        let stale: Vec<String> = self
            .descriptors
            .values()
            .filter(|descriptor| {
                descriptor
                    .parameters
                    .iter()
                    .any(|param| param.declared_type.as_deref() == Some(name.as_str()))
            })
            .map(|descriptor| descriptor.name.clone())
            .collect();
        for type_name in &stale {
            self.descriptors.remove(type_name);
            tracing::debug!(type_name = %type_name, dependency = %name, "dropped stale descriptor");
        }
        Ok(stale)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn manifest(&self, name: &str) -> Result<&TypeManifest> {
        self.registry
            .get(name)
            .ok_or_else(|| ContainerError::TypeNotFound(name.to_string()))
    }

    pub fn is_interface(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .map(|manifest| manifest.kind() == TypeKind::Abstract)
            .unwrap_or(false)
    }

    /// 获取类型描述，仅首次调用时检查清单
    pub fn describe(&mut self, name: &str) -> Result<Arc<TypeDescriptor>> {
        if let Some(descriptor) = self.descriptors.get(name) {
            return Ok(Arc::clone(descriptor));
        }

        let manifest = self.manifest(name)?;
        let parameters = manifest
            .params()
            .iter()
            .map(|param| {
                let (declared_type, kind) = match &param.ty {
                    ParamType::Class(type_name) => {
                        let kind = match self.registry.get(type_name).map(TypeManifest::kind) {
                            Some(TypeKind::Concrete) => ParamKind::Concrete,
                            Some(TypeKind::Abstract) => ParamKind::Interface,
                            None => ParamKind::NotInspectable,
                        };
                        (Some(type_name.clone()), kind)
                    }
                    ParamType::Scalar(scalar) => {
                        (Some(scalar.to_string()), ParamKind::NotInspectable)
                    }
                    ParamType::Enum(enum_name) => {
                        (Some(enum_name.clone()), ParamKind::NotInspectable)
                    }
                    ParamType::Untyped => (None, ParamKind::NotInspectable),
                };
                ParamDescriptor {
                    name: param.name.clone(),
                    declared_type,
                    kind,
                }
            })
            .collect();

        let descriptor = Arc::new(TypeDescriptor {
            name: name.to_string(),
            kind: manifest.kind(),
            parameters,
            reset_marker: manifest.is_reset_marked(),
        });
        tracing::trace!(type_name = %name, "inspected type");
        self.descriptors
            .insert(name.to_string(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// 已检查的描述
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.descriptors.values()
    }
}
