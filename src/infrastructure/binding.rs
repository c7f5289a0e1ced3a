//! 接口到实现类的绑定

use indexmap::IndexMap;

/// 接口名 -> 具体类名
pub type Bindings = IndexMap<String, String>;

/// 用 `"Interface" => "Class"` 键值对构建 [`Bindings`]
#[macro_export]
macro_rules! bindings {
    ($($interface:expr => $class:expr),* $(,)?) => {{
        let mut map = $crate::infrastructure::binding::Bindings::new();
        $(
            map.insert($interface.to_string(), $class.to_string());
        )*
        map
    }};
}

#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    map: Bindings,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并显式绑定，同一接口的新条目覆盖旧条目
    pub fn bind<I, K, V>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (interface, class) in bindings {
            let (interface, class) = (interface.into(), class.into());
            tracing::debug!(interface = %interface, class = %class, "bound interface");
            self.map.insert(interface, class);
        }
    }

    /// 插入提供者声明的绑定，接口已绑定时保持不变
    ///
    /// 返回接口最终绑定的类
    pub fn fill(&mut self, interface: &str, class: &str) -> &str {
        self.map
            .entry(interface.to_string())
            .or_insert_with(|| {
                tracing::debug!(interface = %interface, class = %class, "bound interface from provider");
                class.to_string()
            })
            .as_str()
    }

    /// 对每个条目执行 [`BindingTable::fill`]
    pub fn fill_all(&mut self, bindings: &Bindings) {
        for (interface, class) in bindings {
            self.fill(interface, class);
        }
    }

    pub fn get(&self, interface: &str) -> Option<&str> {
        self.map.get(interface).map(String::as_str)
    }

    pub fn as_map(&self) -> &Bindings {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
