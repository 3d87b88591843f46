//! 成分数据模型
//!
//! 定义单个成分处理管线中流动的所有数据结构：
//! - `SourceResult`：一次数据源查询的结果（永不抛错，失败编码在字段里）
//! - `IngredientProfile`：综合分析后的结构化成分档案

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 数据源标识
///
/// 序列化时使用原始数据源的显示名称（与缓存记录保持一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    /// 本地食品添加剂数据表（E 编号）
    #[serde(rename = "Local DB")]
    LocalDb,
    /// DuckDuckGo 网页搜索
    #[serde(rename = "DuckDuckGo")]
    DuckDuckGo,
    /// Wikipedia 百科摘要
    #[serde(rename = "Wikipedia")]
    Wikipedia,
    /// Open Food Facts 成分库
    #[serde(rename = "Open Food Facts")]
    OpenFoodFacts,
    /// Open Food Facts 产品标签搜索（成分库未命中时的兜底）
    #[serde(rename = "Open Food Facts Products")]
    OpenFoodFactsProducts,
    /// USDA FoodData Central 营养数据库
    #[serde(rename = "USDA FoodData Central")]
    Usda,
    /// PubChem 化学数据库
    #[serde(rename = "PubChem")]
    PubChem,
}

impl SourceId {
    /// 获取显示名称
    pub fn label(self) -> &'static str {
        match self {
            SourceId::LocalDb => "Local DB",
            SourceId::DuckDuckGo => "DuckDuckGo",
            SourceId::Wikipedia => "Wikipedia",
            SourceId::OpenFoodFacts => "Open Food Facts",
            SourceId::OpenFoodFactsProducts => "Open Food Facts Products",
            SourceId::Usda => "USDA FoodData Central",
            SourceId::PubChem => "PubChem",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// 数据源载荷
///
/// 用带标签的变体类型区分三种载荷形态，
/// 格式化时按变体静态分派，不做运行时类型判断
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourcePayload {
    /// 键值记录（如本地表的一行、API 返回的 JSON 对象）
    Record(Map<String, Value>),
    /// 条目列表（如多条搜索结果）
    Entries(Vec<Value>),
    /// 纯文本（如百科摘要）
    Text(String),
}

/// 一次数据源查询的结果
///
/// 约定：适配器永不返回 Err，内部错误编码为 `found=false` + `error`
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub source: SourceId,
    pub found: bool,
    pub data: Option<SourcePayload>,
    pub error: Option<String>,
}

impl SourceResult {
    /// 查询成功并取得数据
    pub fn found(source: SourceId, data: SourcePayload) -> Self {
        Self {
            source,
            found: true,
            data: Some(data),
            error: None,
        }
    }

    /// 查询成功但无数据
    pub fn not_found(source: SourceId) -> Self {
        Self {
            source,
            found: false,
            data: None,
            error: None,
        }
    }

    /// 查询失败（超时/网络/解析错误）
    pub fn failed(source: SourceId, error: impl Into<String>) -> Self {
        Self {
            source,
            found: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// 饮食类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DietType {
    #[serde(rename = "vegan")]
    Vegan,
    #[serde(rename = "vegetarian")]
    Vegetarian,
    #[serde(rename = "non-vegetarian")]
    NonVegetarian,
    #[serde(rename = "unknown")]
    #[default]
    Unknown,
}

impl DietType {
    /// 宽容解析（接受大小写和连字符变体）
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "vegan" => DietType::Vegan,
            "vegetarian" => DietType::Vegetarian,
            "non-vegetarian" | "non vegetarian" | "nonvegetarian" => DietType::NonVegetarian,
            _ => DietType::Unknown,
        }
    }

    /// 获取显示名称
    pub fn label(self) -> &'static str {
        match self {
            DietType::Vegan => "Vegan",
            DietType::Vegetarian => "Vegetarian",
            DietType::NonVegetarian => "Non-Vegetarian",
            DietType::Unknown => "Unknown",
        }
    }

    /// 是否为素食友好（vegan 或 vegetarian）
    pub fn is_vegetarian_friendly(self) -> bool {
        matches!(self, DietType::Vegan | DietType::Vegetarian)
    }
}

/// 成分档案中保留的单个数据源摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDetail {
    pub source: SourceId,
    pub found: bool,
    pub summary: String,
}

/// 未找到任何可靠信息时的默认描述
pub const DESC_NO_INFO: &str = "No reliable information found.";

/// 默认安全评分（信息不足时取中间值）
pub const DEFAULT_SAFETY_RATING: u8 = 5;

/// 结构化成分档案
///
/// 由综合服务生成一次，写入缓存后不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientProfile {
    /// 缓存分配的 ID（未入缓存时为 0）
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    pub is_found: bool,
    pub safety_rating: u8,
    pub description: String,
    #[serde(default)]
    pub health_effects: Vec<String>,
    #[serde(default)]
    pub allergic_info: Vec<String>,
    #[serde(default)]
    pub diet_type: DietType,
    #[serde(default)]
    pub source_details: Vec<SourceDetail>,
}

impl IngredientProfile {
    /// 所有数据源都未命中时的默认档案（不调用推理服务）
    pub fn not_found(name: impl Into<String>, source_details: Vec<SourceDetail>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            alternate_names: Vec::new(),
            is_found: false,
            safety_rating: DEFAULT_SAFETY_RATING,
            description: DESC_NO_INFO.to_string(),
            health_effects: vec!["Unknown - insufficient data".to_string()],
            allergic_info: Vec::new(),
            diet_type: DietType::Unknown,
            source_details,
        }
    }

    /// 管线异常时的降级档案（保证评分仍在 [1,10] 内）
    pub fn degraded(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            alternate_names: Vec::new(),
            is_found: false,
            safety_rating: DEFAULT_SAFETY_RATING,
            description: description.into(),
            health_effects: vec!["Unknown".to_string()],
            allergic_info: Vec::new(),
            diet_type: DietType::Unknown,
            source_details: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diet_type_parse_variants() {
        assert_eq!(DietType::parse("Vegan"), DietType::Vegan);
        assert_eq!(DietType::parse("VEGETARIAN"), DietType::Vegetarian);
        assert_eq!(DietType::parse("Non-Vegetarian"), DietType::NonVegetarian);
        assert_eq!(DietType::parse("non vegetarian"), DietType::NonVegetarian);
        assert_eq!(DietType::parse("carnivore"), DietType::Unknown);
    }

    #[test]
    fn test_source_id_serializes_as_label() {
        let json = serde_json::to_string(&SourceId::Usda).unwrap();
        assert_eq!(json, "\"USDA FoodData Central\"");
        let json = serde_json::to_string(&SourceId::LocalDb).unwrap();
        assert_eq!(json, "\"Local DB\"");
    }

    #[test]
    fn test_not_found_profile_defaults() {
        let profile = IngredientProfile::not_found("Sugar", Vec::new());
        assert!(!profile.is_found);
        assert_eq!(profile.safety_rating, DEFAULT_SAFETY_RATING);
        assert_eq!(profile.description, DESC_NO_INFO);
        assert!((1..=10).contains(&profile.safety_rating));
    }

    #[test]
    fn test_payload_untagged_roundtrip() {
        let text = SourcePayload::Text("hello".to_string());
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json, serde_json::json!("hello"));

        let entries = SourcePayload::Entries(vec![serde_json::json!({"query": "q"})]);
        let json = serde_json::to_value(&entries).unwrap();
        assert!(json.is_array());
    }
}
