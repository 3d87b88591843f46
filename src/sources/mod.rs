//! 数据源适配器 - 数据源层
//!
//! ## 职责
//!
//! 每个模块封装一个外部数据源的查询能力，只处理单个成分名称。
//!
//! ## 契约
//!
//! - `fetch` 永不返回 Err：超时、网络、解析错误一律编码为
//!   `found=false` + `error` 字段
//! - 每个适配器自带请求超时，聚合层不再额外设置全局时限
//! - 适配器之间互不感知，失败互不影响

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{SourceId, SourceResult};

pub mod duckduckgo;
pub mod local_db;
pub mod open_food_facts;
pub mod pubchem;
pub mod usda;
pub mod wikipedia;

pub use duckduckgo::DuckDuckGoSource;
pub use local_db::LocalDbSource;
pub use open_food_facts::OpenFoodFactsSource;
pub use pubchem::PubChemSource;
pub use usda::UsdaSource;
pub use wikipedia::WikipediaSource;

/// 数据源适配器
///
/// 纯查询能力：成分名称进，`SourceResult` 出
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// 适配器对应的数据源标识
    fn id(&self) -> SourceId;

    /// 查询单个成分
    ///
    /// 永不返回 Err，失败编码在 `SourceResult` 内
    async fn fetch(&self, ingredient: &str) -> SourceResult;
}

/// 按固定顺序构建全部六个适配器
///
/// 输出顺序即聚合结果的顺序：
/// 本地表 → 网页搜索 → 百科 → 食品库 → 营养库 → 化学库
pub fn default_adapters(config: &Config) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(LocalDbSource::new()),
        Arc::new(DuckDuckGoSource::new(config)),
        Arc::new(WikipediaSource::new(config)),
        Arc::new(OpenFoodFactsSource::new(config)),
        Arc::new(UsdaSource::new(config)),
        Arc::new(PubChemSource::new(config)),
    ]
}
