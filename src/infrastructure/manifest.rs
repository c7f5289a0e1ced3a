//! 静态类型清单
//!
//! 每个可构造类型在启动时描述一次自身：
//! - 类型名，以及是具体类还是接口
//! - 按声明顺序排列的构造参数
//! - 由解析出的参数创建实例的闭包
//! - 可以作为哪些接口提供
//! - 是否参与选择性重置

use crate::errors::{ContainerError, Result};
use indexmap::IndexMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 类型擦除的共享服务实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 用编译器收集的参数创建实例
pub type Constructor = Arc<dyn Fn(&Arguments) -> Result<Instance> + Send + Sync>;

/// 把类的实例转换为其某个接口的 `Arc<Arc<I>>`
pub type Upcast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// 具体类或接口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Concrete,
    Abstract,
}

/// 构造参数的声明类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// 引用另一个已注册的类或接口
    Class(String),
    /// 内置值，如 `int`、`string`
    Scalar(&'static str),
    /// 枚举类型，容器从不提供
    Enum(String),
    Untyped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: ParamType,
}

/// `Container::selective_reset` 调用的重置能力
pub trait Resettable: Send + Sync {
    fn reset(&self);
}

/// 从 `Resettable` 类型捕获的重置能力
#[derive(Clone)]
pub struct ResetHook {
    check: Arc<dyn Fn(&Instance) -> bool + Send + Sync>,
    apply: Arc<dyn Fn(&Instance) + Send + Sync>,
}

impl ResetHook {
    fn of<T: Resettable + 'static>() -> Self {
        Self {
            check: Arc::new(|instance: &Instance| instance.is::<T>()),
            apply: Arc::new(|instance: &Instance| {
                if let Some(target) = instance.downcast_ref::<T>() {
                    target.reset();
                }
            }),
        }
    }

    /// 缓存的实例是否确实是可重置类型
    pub fn supports(&self, instance: &Instance) -> bool {
        (self.check)(instance)
    }

    pub fn apply(&self, instance: &Instance) {
        (self.apply)(instance)
    }
}

/// 有序的具名构造参数
#[derive(Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, Instance>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`Arguments::insert`] 的构建器形式
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Arc::new(value));
    }

    /// 插入已共享的值，不再包装
    pub fn insert_instance(&mut self, name: impl Into<String>, value: Instance) {
        self.values.insert(name.into(), value);
    }

    /// 插入接口句柄，之后用 [`Arguments::get_as`] 读取
    pub fn insert_as<I: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        value: Arc<I>,
    ) {
        self.values.insert(name.into(), Arc::new(value));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.values.get(name)
    }

    /// 获取具体类型的共享值
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| ContainerError::MissingArgument(name.to_string()))?;
        value
            .clone()
            .downcast::<T>()
            .map_err(|_| ContainerError::ArgumentTypeMismatch {
                parameter: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// 获取接口类型的参数，例如 `get_as::<dyn Transport>("transport")`
    pub fn get_as<I: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<I>> {
        self.get::<Arc<I>>(name).map(|handle| Arc::clone(&*handle))
    }

    /// 获取普通值的克隆，如从配置读取的标量
    pub fn value<T: Any + Send + Sync + Clone>(&self, name: &str) -> Result<T> {
        self.get::<T>(name).map(|value| (*value).clone())
    }

    /// 复制 `other` 中尚不存在的条目
    pub fn merge_missing(&mut self, other: &Arguments) {
        for (name, value) in &other.values {
            self.values
                .entry(name.clone())
                .or_insert_with(|| Arc::clone(value));
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// 可构造类型的自描述
#[derive(Clone)]
pub struct TypeManifest {
    name: String,
    kind: TypeKind,
    params: Vec<ParamSpec>,
    constructor: Option<Constructor>,
    rust_type: Option<TypeId>,
    upcasts: IndexMap<String, Upcast>,
    reset_marker: bool,
    reset_hook: Option<ResetHook>,
}

impl TypeManifest {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            params: Vec::new(),
            constructor: None,
            rust_type: None,
            upcasts: IndexMap::new(),
            reset_marker: false,
            reset_hook: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Concrete)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Abstract)
    }

    /// 没有构造函数的类，实例总是通过 `Container::set` 从外部注入
    pub fn external<T: Any + Send + Sync>(name: impl Into<String>) -> Self {
        let mut manifest = Self::class(name);
        manifest.rust_type = Some(TypeId::of::<T>());
        manifest
    }

    /// 声明类型为另一个类或接口的参数
    pub fn param(self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.push(name, ParamType::Class(type_name.into()))
    }

    pub fn scalar(self, name: impl Into<String>, scalar: &'static str) -> Self {
        self.push(name, ParamType::Scalar(scalar))
    }

    pub fn enumeration(self, name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        self.push(name, ParamType::Enum(enum_name.into()))
    }

    pub fn untyped(self, name: impl Into<String>) -> Self {
        self.push(name, ParamType::Untyped)
    }

    fn push(mut self, name: impl Into<String>, ty: ParamType) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn constructor<T, F>(mut self, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.rust_type = Some(TypeId::of::<T>());
        self.constructor = Some(Arc::new(move |args: &Arguments| {
            build(args).map(|value| Arc::new(value) as Instance)
        }));
        self
    }

    /// 声明 `C` 的实例可以作为接口 `I` 提供
    pub fn implements<C, I>(
        mut self,
        interface: impl Into<String>,
        cast: impl Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static,
    ) -> Self
    where
        C: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
    {
        let upcast: Upcast = Arc::new(move |instance: &Instance| {
            let concrete = Arc::clone(instance).downcast::<C>().ok()?;
            Some(Arc::new(cast(concrete)) as Instance)
        });
        self.upcasts.insert(interface.into(), upcast);
        self
    }

    /// 标记参与选择性重置，但不提供重置能力
    pub fn reset_marker(mut self) -> Self {
        self.reset_marker = true;
        self
    }

    pub fn resettable<T: Resettable + 'static>(mut self) -> Self {
        self.reset_marker = true;
        self.reset_hook = Some(ResetHook::of::<T>());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    pub fn is_reset_marked(&self) -> bool {
        self.reset_marker
    }

    pub fn reset_hook(&self) -> Option<&ResetHook> {
        self.reset_hook.as_ref()
    }

    /// 调用构造函数，接口和没有构造函数的类无法创建
    pub fn construct(&self, args: &Arguments) -> Result<Instance> {
        match (&self.kind, &self.constructor) {
            (TypeKind::Abstract, _) => Err(ContainerError::NotConstructible(self.name.clone())),
            (TypeKind::Concrete, Some(build)) => build(args),
            (TypeKind::Concrete, None) => Err(ContainerError::NoConstructor(self.name.clone())),
        }
    }

    /// 把本类实例转换为 `interface` 的句柄
    pub fn upcast(&self, interface: &str, instance: &Instance) -> Result<Instance> {
        self.upcasts
            .get(interface)
            .and_then(|cast| cast(instance))
            .ok_or_else(|| ContainerError::NotAnImplementation {
                class: self.name.clone(),
                interface: interface.to_string(),
            })
    }
}

impl fmt::Debug for TypeManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeManifest")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("interfaces", &self.upcasts.keys().collect::<Vec<_>>())
            .field("reset_marker", &self.reset_marker)
            .finish()
    }
}

/// 一个容器已知的全部类型清单
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    manifests: IndexMap<String, TypeManifest>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, manifest: TypeManifest) -> Result<()> {
        if self.manifests.contains_key(manifest.name()) {
            return Err(ContainerError::TypeAlreadyRegistered(
                manifest.name().to_string(),
            ));
        }
        self.manifests.insert(manifest.name().to_string(), manifest);
        Ok(())
    }

    /// [`TypeRegistry::register`] 的构建器形式
    pub fn with(mut self, manifest: TypeManifest) -> Result<Self> {
        self.register(manifest)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&TypeManifest> {
        self.manifests.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.manifests.contains_key(name)
    }

    /// 查找声明了 `type_id` 的类的注册名
    pub fn name_of(&self, type_id: TypeId) -> Option<&str> {
        self.manifests
            .values()
            .find(|manifest| manifest.rust_type == Some(type_id))
            .map(TypeManifest::name)
    }

    /// 按注册顺序返回清单
    pub fn manifests(&self) -> impl Iterator<Item = &TypeManifest> {
        self.manifests.values()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}
