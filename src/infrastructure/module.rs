//! 模块
//!
//! 模块打包一个功能的类型清单、提供者和绑定，一次调用即可安装到容器。

use super::binding::Bindings;
use super::manifest::TypeManifest;
use super::provider::Provider;
use std::sync::Arc;

/// 通过 `Container::install` 安装的功能包
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    /// 本模块提供的类型清单
    fn types(&self) -> Vec<TypeManifest>;

    fn providers(&self) -> Vec<(String, Arc<dyn Provider>)> {
        Vec::new()
    }

    /// 在提供者之后应用，覆盖提供者声明的绑定
    fn bindings(&self) -> Bindings {
        Bindings::new()
    }
}
