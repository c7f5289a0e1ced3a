/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// `get` 调用总数
    pub total_resolutions: u64,
    /// 命中实例缓存的调用
    pub cache_hits: u64,
    /// 需要编译的调用
    pub cache_misses: u64,
    /// 重新计算的依赖图
    pub fresh_resolutions: u64,
    /// 复用记忆的依赖图
    pub memo_hits: u64,
    /// 已构造的实例数
    pub instances_built: u64,
    pub soft_resets: u64,
    pub selective_resets: u64,
}

impl ContainerStats {
    /// 缓存命中率（百分比）
    pub fn cache_hit_rate(&self) -> f64 {
        self.hit_rate() * 100.0
    }

    /// 缓存命中率（小数）
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn total(&self) -> u64 {
        self.total_resolutions
    }

    pub fn performance_summary(&self) -> String {
        format!(
            "Container Performance: {} total resolutions, {:.1}% cache hit rate, {} maps resolved, {} memo hits, {} instances built",
            self.total_resolutions,
            self.cache_hit_rate(),
            self.fresh_resolutions,
            self.memo_hits,
            self.instances_built
        )
    }
}
