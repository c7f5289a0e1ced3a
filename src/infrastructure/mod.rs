//! 容器内部实现
//!
//! 自底向上：
//! - `manifest`：静态声明的类型、构造函数和参数
//! - `inspector`：类型描述缓存
//! - `binding` 与 `provider`：接口绑定和构建定制
//! - `resolver`：依赖图展开与循环检测
//! - `compiler`：按序实例化并写入实例缓存
//! - `container`：组合以上各部分的门面

pub mod binding;
pub mod compiler;
pub mod container;
pub mod inspector;
pub mod instance;
pub mod manifest;
pub mod module;
pub mod provider;
pub mod resolver;

pub use binding::{BindingTable, Bindings};
pub use compiler::Compiler;
pub use container::{Container, ContainerStats, SharedContainer};
pub use inspector::{ParamDescriptor, ParamKind, TypeDescriptor, TypeInspector};
pub use instance::InstanceCache;
pub use manifest::{Arguments, Instance, Resettable, TypeKind, TypeManifest, TypeRegistry};
pub use module::Module;
pub use provider::{ArgumentsProvider, Factory, Finalizer, Provider, ProviderRegistry, ServiceView};
pub use resolver::{DependencyMap, DependencyResolver};
