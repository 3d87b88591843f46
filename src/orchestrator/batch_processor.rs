//! 批量成分处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责单成分管线与批次处理的编排。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：装配缓存、数据源适配器、推理服务
//! 2. **缓存短路**：命中缓存的成分直接返回，不消耗任何外部调用
//! 3. **并发控制**：使用 Semaphore 限制同时运行的未缓存管线数量
//! 4. **失败隔离**：批次中单个成分的任务崩溃不影响其他成分
//! 5. **产品汇总**：全部成分完成后生成产品级分析
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个数据源或提示词的细节
//! - **向下委托**：聚合委托 SourceAggregator，综合委托 IngredientSynthesizer
//! - **并发安全**：通过 Semaphore 和 tokio::spawn 实现并发

use std::sync::Arc;
use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cache::IngredientCache;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{BatchOutcome, IngredientProfile, UserPreferences};
use crate::services::{
    IngredientSynthesizer, LlmOracle, Oracle, ProductAnalyzer, SourceAggregator,
};
use crate::sources::{default_adapters, SourceAdapter};

/// 应用主结构
///
/// 所有字段都是 Arc 共享，clone 成本为引用计数
#[derive(Clone)]
pub struct App {
    config: Config,
    cache: Arc<IngredientCache>,
    aggregator: Arc<SourceAggregator>,
    synthesizer: Arc<IngredientSynthesizer>,
    product_analyzer: Arc<ProductAnalyzer>,
    semaphore: Arc<Semaphore>,
}

impl App {
    /// 以默认组件初始化应用（全部六个数据源 + LLM 推理服务）
    pub fn new(config: Config) -> Self {
        let oracle: Arc<dyn Oracle> = Arc::new(LlmOracle::new(&config));
        let adapters = default_adapters(&config);
        Self::with_components(config, Arc::new(IngredientCache::new()), adapters, oracle)
    }

    /// 以注入的组件初始化应用
    ///
    /// 测试时可传入桩适配器和桩推理服务
    pub fn with_components(
        config: Config,
        cache: Arc<IngredientCache>,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        oracle: Arc<dyn Oracle>,
    ) -> Self {
        log_startup(&config, adapters.len());

        let semaphore = Arc::new(Semaphore::new(config.parallel_rate_limit));

        Self {
            aggregator: Arc::new(SourceAggregator::new(adapters)),
            synthesizer: Arc::new(IngredientSynthesizer::new(Arc::clone(&oracle))),
            product_analyzer: Arc::new(ProductAnalyzer::new(oracle)),
            cache,
            config,
            semaphore,
        }
    }

    /// 处理单个成分
    ///
    /// 缓存命中直接返回，不触碰数据源、推理服务或信号量；
    /// 未命中时在信号量许可内执行聚合与综合，完成后写入缓存
    pub async fn process_ingredient(&self, ingredient: &str) -> AppResult<IngredientProfile> {
        if let Some(cached) = self.cache.get(ingredient)? {
            info!("💾 缓存命中: {} (id={})", ingredient, cached.id);
            return Ok(cached);
        }

        // 许可只覆盖聚合与综合，缓存写入在许可释放之后
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Other(format!("信号量已关闭: {}", e)))?;

        info!("🔬 开始处理未缓存成分: {}", ingredient);
        let results = self.aggregator.collect_all(ingredient).await;
        let mut profile = self.synthesizer.synthesize(ingredient, &results).await;
        drop(permit);

        profile.id = self.cache.create(profile.clone())?;
        Ok(profile)
    }

    /// 处理一批成分并生成产品级分析
    ///
    /// 成分之间并发执行（受信号量约束），结果顺序与输入顺序一致。
    /// 单个成分的任务崩溃降级为默认档案，缓存故障向上传播
    pub async fn process_batch(
        &self,
        ingredients: &[String],
        preferences: Option<&UserPreferences>,
    ) -> AppResult<BatchOutcome> {
        info!("\n{}", "=".repeat(60));
        info!("📦 开始批次处理，共 {} 个成分", ingredients.len());
        info!("{}", "=".repeat(60));

        let mut handles: Vec<(usize, String, JoinHandle<AppResult<IngredientProfile>>)> =
            Vec::with_capacity(ingredients.len());

        for (idx, ingredient) in ingredients.iter().enumerate() {
            let app = self.clone();
            let name = ingredient.clone();
            let handle = tokio::spawn(async move { app.process_ingredient(&name).await });
            handles.push((idx, ingredient.clone(), handle));
        }

        let mut profiles: Vec<Option<IngredientProfile>> = vec![None; ingredients.len()];

        for (idx, name, handle) in handles {
            match handle.await {
                Ok(Ok(profile)) => {
                    profiles[idx] = Some(profile);
                }
                Ok(Err(e)) => {
                    // 缓存故障是致命错误，整个批次失败
                    error!("[成分 {}] ❌ 处理失败: {}", name, e);
                    return Err(e);
                }
                Err(e) => {
                    error!("[成分 {}] 任务执行失败: {}", name, e);
                    profiles[idx] = Some(IngredientProfile::degraded(
                        &name,
                        "Error processing this ingredient",
                    ));
                }
            }
        }

        let profiles: Vec<IngredientProfile> =
            profiles.into_iter().map(|p| p.unwrap_or_else(|| {
                IngredientProfile::degraded("", "Error processing this ingredient")
            })).collect();

        let analysis = self.product_analyzer.analyze(profiles.as_slice(), preferences).await;
        let ingredient_ids = analysis.ingredient_ids.clone();

        info!("\n{}", "─".repeat(60));
        info!(
            "✓ 批次完成: {}/{} 个成分有可靠数据",
            profiles.iter().filter(|p| p.is_found).count(),
            profiles.len()
        );
        info!("{}", "─".repeat(60));

        Ok(BatchOutcome {
            ingredients_count: profiles.len(),
            profiles,
            analysis,
            ingredient_ids,
            timestamp: Utc::now(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<IngredientCache> {
        &self.cache
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config, adapter_count: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 成分分析核心启动");
    info!("📊 最大并发管线数: {}", config.parallel_rate_limit);
    info!("🔌 数据源适配器数量: {}", adapter_count);
    info!("🤖 推理模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}
