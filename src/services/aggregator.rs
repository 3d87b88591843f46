//! 数据源聚合服务 - 业务能力层
//!
//! 并发执行全部数据源适配器，单个源的失败不影响其他源，
//! 输出顺序与适配器注册顺序一致

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::models::SourceResult;
use crate::sources::SourceAdapter;

/// 数据源聚合服务
///
/// 职责：
/// - 并发触发所有适配器的查询
/// - 保证结果顺序与注册顺序一致
/// - 任务崩溃编码为失败结果，不向上抛
pub struct SourceAggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceAggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// 并发查询全部数据源
    ///
    /// 每个适配器在独立任务中运行，全部完成后按注册顺序返回
    pub async fn collect_all(&self, ingredient: &str) -> Vec<SourceResult> {
        info!("🔍 开始聚合 {} 个数据源: {}", self.adapters.len(), ingredient);

        let mut handles: Vec<(crate::models::SourceId, JoinHandle<SourceResult>)> =
            Vec::with_capacity(self.adapters.len());

        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let source = adapter.id();
            let name = ingredient.to_string();
            let handle = tokio::spawn(async move { adapter.fetch(&name).await });
            handles.push((source, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (source, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("数据源任务崩溃 [{}]: {}", source, e);
                    results.push(SourceResult::failed(source, format!("任务执行失败: {}", e)));
                }
            }
        }

        let found = results.iter().filter(|r| r.found).count();
        info!("📊 数据源聚合完成: {}/{} 命中", found, results.len());

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceId, SourcePayload};
    use async_trait::async_trait;
    use std::time::Duration;

    /// 固定返回命中的桩适配器
    struct StubAdapter {
        id: SourceId,
        delay_ms: u64,
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn id(&self) -> SourceId {
            self.id
        }

        async fn fetch(&self, ingredient: &str) -> SourceResult {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            SourceResult::found(self.id, SourcePayload::Text(ingredient.to_string()))
        }
    }

    /// 结果顺序跟随注册顺序，而非完成顺序
    #[tokio::test]
    async fn test_results_follow_registration_order() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(StubAdapter { id: SourceId::Wikipedia, delay_ms: 50 }),
            Arc::new(StubAdapter { id: SourceId::LocalDb, delay_ms: 0 }),
            Arc::new(StubAdapter { id: SourceId::PubChem, delay_ms: 20 }),
        ]);

        let results = aggregator.collect_all("Sugar").await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].source, SourceId::Wikipedia);
        assert_eq!(results[1].source, SourceId::LocalDb);
        assert_eq!(results[2].source, SourceId::PubChem);
        assert!(results.iter().all(|r| r.found));
    }

    /// 会 panic 的适配器被编码为失败结果，不影响其他源
    struct PanickingAdapter;

    #[async_trait]
    impl SourceAdapter for PanickingAdapter {
        fn id(&self) -> SourceId {
            SourceId::Usda
        }

        async fn fetch(&self, _ingredient: &str) -> SourceResult {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_panicking_adapter_is_isolated() {
        let aggregator = SourceAggregator::new(vec![
            Arc::new(StubAdapter { id: SourceId::LocalDb, delay_ms: 0 }),
            Arc::new(PanickingAdapter),
        ]);

        let results = aggregator.collect_all("Salt").await;

        assert_eq!(results.len(), 2);
        assert!(results[0].found);
        assert!(!results[1].found);
        assert_eq!(results[1].source, SourceId::Usda);
        assert!(results[1].error.is_some());
    }
}
