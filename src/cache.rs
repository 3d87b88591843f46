//! 成分档案缓存 - 基础设施层
//!
//! 对外只有两个操作：`get(name)` / `create(profile)`。
//!
//! ## 查找语义
//!
//! 1. 先按名称做大小写不敏感的精确匹配
//! 2. 未命中时扫描各档案的别名集合（同样大小写不敏感）
//!
//! ## 约定
//!
//! - 缓存命中是权威结果：编排层命中后不得再触碰数据源、推理服务或信号量
//! - 缓存故障是致命错误，向调用方传播（见 error.rs）

use std::sync::RwLock;

use tracing::debug;

use crate::error::{AppResult, CacheError};
use crate::models::IngredientProfile;

/// 进程内成分档案缓存
///
/// 读共享、写追加；档案一经写入不再修改
pub struct IngredientCache {
    profiles: RwLock<Vec<IngredientProfile>>,
}

impl IngredientCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(Vec::new()),
        }
    }

    /// 按名称查找档案
    ///
    /// 精确匹配优先，别名匹配兜底；未命中返回 `Ok(None)`
    pub fn get(&self, name: &str) -> AppResult<Option<IngredientProfile>> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| CacheError::LockPoisoned { operation: "get" })?;

        let lowered = name.to_lowercase();

        if let Some(profile) = profiles
            .iter()
            .find(|p| p.name.to_lowercase() == lowered)
        {
            debug!("缓存精确命中: {}", name);
            return Ok(Some(profile.clone()));
        }

        if let Some(profile) = profiles.iter().find(|p| {
            p.alternate_names
                .iter()
                .any(|alt| alt.to_lowercase() == lowered)
        }) {
            debug!("缓存别名命中: {}", name);
            return Ok(Some(profile.clone()));
        }

        Ok(None)
    }

    /// 写入新档案并返回分配的 ID
    pub fn create(&self, mut profile: IngredientProfile) -> AppResult<i64> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| CacheError::LockPoisoned { operation: "create" })?;

        let id = profiles.len() as i64 + 1;
        profile.id = id;
        debug!("缓存写入: {} (id={})", profile.name, id);
        profiles.push(profile);

        Ok(id)
    }

    /// 当前缓存的档案数量
    pub fn len(&self) -> AppResult<usize> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| CacheError::LockPoisoned { operation: "len" })?;
        Ok(profiles.len())
    }

    pub fn is_empty(&self) -> AppResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for IngredientCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile(name: &str, alternates: &[&str]) -> IngredientProfile {
        let mut profile = IngredientProfile::degraded(name, "test");
        profile.alternate_names = alternates.iter().map(|s| s.to_string()).collect();
        profile
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let cache = IngredientCache::new();
        cache.create(sample_profile("Sodium Benzoate", &[])).unwrap();

        let hit = cache.get("sodium benzoate").unwrap();
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().name, "Sodium Benzoate");
    }

    #[test]
    fn test_alternate_name_match() {
        let cache = IngredientCache::new();
        cache
            .create(sample_profile("Monosodium Glutamate", &["MSG", "E621"]))
            .unwrap();

        let hit = cache.get("msg").unwrap();
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().name, "Monosodium Glutamate");
    }

    #[test]
    fn test_miss_returns_none() {
        let cache = IngredientCache::new();
        assert!(cache.get("unknown").unwrap().is_none());
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let cache = IngredientCache::new();
        let id1 = cache.create(sample_profile("Salt", &[])).unwrap();
        let id2 = cache.create(sample_profile("Sugar", &[])).unwrap();
        assert_eq!(id1, 1);
        assert_eq!(id2, 2);

        let hit = cache.get("Salt").unwrap().unwrap();
        assert_eq!(hit.id, 1);
    }
}
