//! # Food Analyzer
//!
//! 一个用于食品成分信息聚合与综合分析的 Rust 核心库
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `cache` - 进程内成分档案缓存，名称与别名双路查找
//! - `config` - 环境变量配置
//! - `error` - 错误类型（唯一的硬错误是缓存故障）
//!
//! ### ② 数据源层（Sources）
//! - `sources/` - 六个外部数据源适配器，只处理单个成分名称
//! - `SourceAdapter` - 统一查询接口，失败编码在结果内，永不抛错
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，互不感知
//! - `SourceAggregator` - 并发聚合全部数据源
//! - `IngredientSynthesizer` - 多源数据综合成成分档案
//! - `ProductAnalyzer` - 多个成分档案综合成产品结论
//! - `Oracle` / `LlmOracle` - LLM 推理接口与实现
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 缓存短路、并发管线调度、批次汇总
//!
//! ## 模块结构

pub mod cache;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod sources;
pub mod utils;

// 重新导出常用类型
pub use cache::IngredientCache;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    BatchOutcome, DietType, IngredientProfile, ProductAnalysis, SourceId, SourcePayload,
    SourceResult, UserPreferences,
};
pub use orchestrator::App;
pub use services::{Oracle, SourceAggregator};
pub use sources::SourceAdapter;
