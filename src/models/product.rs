//! 产品级数据模型
//!
//! 定义整个产品（多成分批次）的分析结果与用户偏好上下文

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ingredient::{DietType, IngredientProfile};

/// 用户偏好（可选的批次分析上下文）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: Option<i64>,
    /// 用户已知过敏原
    pub allergies: Option<String>,
    /// 饮食限制（如 vegan）
    pub dietary_restrictions: Option<String>,
}

/// 健康洞察（收益与风险各不超过 3 条）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthInsights {
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// 产品级分析结论
///
/// 每次批次请求重新计算，本核心不负责持久化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAnalysis {
    /// 总体安全评分，范围 [1.0, 10.0]
    pub overall_safety_score: f64,
    pub suitable_diet_types: DietType,
    /// 过敏警告（不超过 5 条）
    #[serde(default)]
    pub allergy_warnings: Vec<String>,
    pub usage_recommendations: String,
    #[serde(default)]
    pub health_insights: HealthInsights,
    #[serde(default)]
    pub ingredient_interactions: Vec<String>,
    pub key_takeaway: String,
    /// 回显本批次各成分的缓存 ID（成功与降级路径都附带）
    #[serde(default)]
    pub ingredient_ids: Vec<i64>,
}

/// 批次处理结果
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub ingredients_count: usize,
    pub profiles: Vec<IngredientProfile>,
    pub analysis: ProductAnalysis,
    pub ingredient_ids: Vec<i64>,
    pub timestamp: DateTime<Utc>,
}
