//! 业务能力层
//!
//! 每个服务封装一种独立能力，互不感知，不关心流程顺序：
//! - `SourceAggregator`: 并发聚合全部数据源
//! - `IngredientSynthesizer`: 把多源数据综合成成分档案
//! - `ProductAnalyzer`: 把多个成分档案综合成产品结论
//! - `Oracle` / `LlmOracle`: LLM 推理接口与实现

pub mod aggregator;
pub mod oracle;
pub mod product_analyzer;
pub mod schema;
pub mod synthesis;

pub use aggregator::SourceAggregator;
pub use oracle::{LlmOracle, Oracle};
pub use product_analyzer::ProductAnalyzer;
pub use synthesis::IngredientSynthesizer;
