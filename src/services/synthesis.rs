//! 成分综合服务 - 业务能力层
//!
//! 把多个数据源的查询结果综合成一份结构化成分档案：
//! 格式化原始数据 → 构建提示词 → 调用推理服务 → 解析并校验响应。
//!
//! ## 契约
//!
//! - `synthesize` 永不失败：推理调用失败或响应不可解析时
//!   返回携带错误说明的降级档案
//! - 全部数据源未命中时直接返回默认档案，不消耗推理调用

use std::sync::Arc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::models::{
    DietType, IngredientProfile, SourceDetail, SourceId, SourcePayload, SourceResult,
    DEFAULT_SAFETY_RATING,
};
use crate::services::oracle::Oracle;
use crate::services::schema;
use crate::utils::truncate_text;

/// 文本载荷进入提示词的最大长度
const TEXT_PAYLOAD_MAX: usize = 1500;

/// 列表载荷中字典条目的最大数量
const ENTRIES_DICT_MAX: usize = 3;

/// 列表载荷中标量条目的最大数量
const ENTRIES_SCALAR_MAX: usize = 5;

/// 成分综合服务
pub struct IngredientSynthesizer {
    oracle: Arc<dyn Oracle>,
}

impl IngredientSynthesizer {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// 综合全部数据源结果，生成结构化成分档案
    pub async fn synthesize(
        &self,
        ingredient: &str,
        results: &[SourceResult],
    ) -> IngredientProfile {
        let source_details = build_source_details(results);
        let found_results: Vec<&SourceResult> = results.iter().filter(|r| r.found).collect();

        info!(
            "开始综合分析: {} ({}/{} 数据源命中)",
            ingredient,
            found_results.len(),
            results.len()
        );

        // 没有任何可用数据时不消耗推理调用
        if found_results.is_empty() {
            info!("⚠️ 无可用数据源，返回默认档案: {}", ingredient);
            return IngredientProfile::not_found(ingredient, source_details);
        }

        let combined_data = combine_payloads(&found_results);
        let prompt = build_analysis_prompt(ingredient, &combined_data);

        let response = match self.oracle.invoke(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("推理服务调用失败: {:#}", e);
                let mut profile = IngredientProfile::degraded(
                    ingredient,
                    format!("Error in analysis: {}", e),
                );
                profile.source_details = source_details;
                return profile;
            }
        };

        debug!("推理服务响应: {}", truncate_text(&response, 500));

        let mut profile = IngredientProfile {
            id: 0,
            name: ingredient.to_string(),
            alternate_names: Vec::new(),
            is_found: true,
            safety_rating: DEFAULT_SAFETY_RATING,
            description: String::new(),
            health_effects: Vec::new(),
            allergic_info: Vec::new(),
            diet_type: DietType::Unknown,
            source_details,
        };

        match crate::utils::json_extract::extract_object(&response) {
            Ok(analysis) => {
                profile.safety_rating =
                    schema::read_rating(&analysis, "safety_rating", DEFAULT_SAFETY_RATING);
                profile.description =
                    schema::read_string(&analysis, "description", "No description available.");
                profile.health_effects = schema::read_string_list(&analysis, "health_effects");
                profile.alternate_names = schema::read_string_list(&analysis, "alternate_names");
                profile.allergic_info = schema::read_string_list(&analysis, "allergic_info");
                profile.diet_type = schema::read_diet(&analysis, "diet_type");
                info!(
                    "✅ 综合分析完成: {} (安全评分 {})",
                    ingredient, profile.safety_rating
                );
            }
            Err(crate::utils::json_extract::ExtractError::NoJsonFound) => {
                warn!("响应中未找到 JSON 对象: {}", ingredient);
                profile.description = "Error: Failed to parse LLM analysis output.".to_string();
            }
            Err(crate::utils::json_extract::ExtractError::ParseFailed(e)) => {
                warn!("响应 JSON 解析失败: {}", e);
                profile.description = format!("Error parsing analysis: {}", e);
            }
        }

        profile
    }
}

/// 为每个数据源结果生成一行摘要
fn build_source_details(results: &[SourceResult]) -> Vec<SourceDetail> {
    results
        .iter()
        .map(|result| SourceDetail {
            source: result.source,
            found: result.found,
            summary: if result.found {
                summarize_source(result)
            } else {
                "No data found".to_string()
            },
        })
        .collect()
}

/// 按数据源类型生成人类可读的摘要
fn summarize_source(result: &SourceResult) -> String {
    let Some(data) = &result.data else {
        return "Data found but empty".to_string();
    };

    match (result.source, data) {
        (SourceId::LocalDb, SourcePayload::Record(record)) => {
            format!(
                "E-Number: {}, Category: {}, Description: {}",
                field_str(record, "E No."),
                field_str(record, "Functional Class"),
                truncate_text(record.get("Main Use").and_then(|v| v.as_str()).unwrap_or(""), 100)
            )
        }
        (SourceId::DuckDuckGo, SourcePayload::Entries(entries)) => {
            match entries.first() {
                Some(first) => format!(
                    "Query: '{}', Result: '{}'",
                    first.get("query").and_then(|v| v.as_str()).unwrap_or(""),
                    truncate_text(
                        first.get("result").and_then(|v| v.as_str()).unwrap_or(""),
                        150
                    )
                ),
                None => "Data found but empty".to_string(),
            }
        }
        (SourceId::Wikipedia, SourcePayload::Text(text)) => {
            let first_paragraph = text.split("\n\n").next().unwrap_or("");
            format!("Wikipedia excerpt: {}", truncate_text(first_paragraph, 200))
        }
        (SourceId::OpenFoodFacts | SourceId::OpenFoodFactsProducts, SourcePayload::Record(record)) => {
            if let Some(product) = record.get("product") {
                format!(
                    "Product info: {}",
                    product
                        .get("product_name")
                        .and_then(|v| v.as_str())
                        .unwrap_or("Unknown")
                )
            } else if let Some(text) = record.get("ingredients_text").and_then(|v| v.as_str()) {
                format!("Ingredients: {}", truncate_text(text, 150))
            } else {
                format!("Found data with {} fields", record.len())
            }
        }
        (SourceId::Usda, SourcePayload::Record(record)) => {
            match record
                .get("foods")
                .and_then(|f| f.as_array())
                .and_then(|foods| foods.first())
            {
                Some(food) => format!(
                    "Food: {}, Category: {}",
                    food.get("description").and_then(|v| v.as_str()).unwrap_or("Unknown"),
                    food.get("foodCategory").and_then(|v| v.as_str()).unwrap_or("N/A")
                ),
                None => "Found USDA data, but no specific foods listed".to_string(),
            }
        }
        (SourceId::PubChem, SourcePayload::Record(record)) => {
            let cid = record
                .get("compound_info")
                .and_then(|c| c.get("PC_Compounds"))
                .and_then(|c| c.as_array())
                .and_then(|compounds| compounds.first())
                .and_then(|compound| compound.get("id"))
                .and_then(|id| id.get("id"))
                .and_then(|id| id.get("cid"))
                .and_then(|cid| cid.as_i64());
            match cid {
                Some(cid) => format!("Chemical ID: {}, Found chemical property data", cid),
                None => format!("Found data from {}", result.source),
            }
        }
        _ => format!("Found data from {}", result.source),
    }
}

/// 把全部命中源的载荷拼接成提示词的数据段
fn combine_payloads(found_results: &[&SourceResult]) -> String {
    let mut sections = Vec::with_capacity(found_results.len());

    for result in found_results {
        let Some(data) = &result.data else { continue };
        let section = match data {
            SourcePayload::Record(record) => format_record(result.source, record),
            SourcePayload::Entries(entries) => format_entries(result.source, entries),
            SourcePayload::Text(text) => {
                format!("--- {} ---\n{}", result.source, truncate_text(text, TEXT_PAYLOAD_MAX))
            }
        };
        sections.push(section);
    }

    sections.join("\n\n")
}

/// 格式化键值记录载荷
fn format_record(source: SourceId, record: &Map<String, Value>) -> String {
    let mut text = format!("--- {} ---\n", source);

    match source {
        SourceId::LocalDb => {
            for (key, value) in record {
                text.push_str(&format!("{}: {}\n", key, scalar_display(value)));
            }
        }
        SourceId::OpenFoodFacts | SourceId::OpenFoodFactsProducts | SourceId::Usda => {
            // 先提取食品库的关键字段，再附上其余标量字段
            for key in ["ingredients_text", "description", "categories"] {
                if let Some(value) = record.get(key).and_then(|v| v.as_str()) {
                    let label = match key {
                        "ingredients_text" => "Ingredients",
                        "description" => "Description",
                        _ => "Categories",
                    };
                    text.push_str(&format!("{}: {}\n", label, value));
                }
            }
            for (key, value) in record {
                if !value.is_object()
                    && !value.is_array()
                    && !["ingredients_text", "description", "categories"].contains(&key.as_str())
                {
                    text.push_str(&format!("{}: {}\n", key, scalar_display(value)));
                }
            }
        }
        SourceId::PubChem => {
            if let Some(cid) = record
                .get("compound_info")
                .and_then(|c| c.get("PC_Compounds"))
                .and_then(|c| c.as_array())
                .and_then(|compounds| compounds.first())
                .and_then(|compound| compound.get("id"))
                .and_then(|id| id.get("id"))
                .and_then(|id| id.get("cid"))
            {
                text.push_str("Chemical information:\n");
                text.push_str(&format!("Compound ID: {}\n", scalar_display(cid)));
            }
            if let Some(props) = record
                .get("properties")
                .and_then(|p| p.get("PropertyTable"))
                .and_then(|t| t.get("Properties"))
                .and_then(|p| p.as_array())
                .and_then(|props| props.first())
                .and_then(|p| p.as_object())
            {
                text.push_str("Properties:\n");
                for (key, value) in props {
                    text.push_str(&format!("{}: {}\n", key, scalar_display(value)));
                }
            }
        }
        _ => {
            // 通用处理：标量和短值直接列出，复杂值折叠
            for (key, value) in record {
                let rendered = scalar_display(value);
                if (!value.is_object() && !value.is_array()) || rendered.len() < 100 {
                    text.push_str(&format!("{}: {}\n", key, rendered));
                } else {
                    text.push_str(&format!("{}: [Complex data]\n", key));
                }
            }
        }
    }

    text
}

/// 格式化条目列表载荷
fn format_entries(source: SourceId, entries: &[Value]) -> String {
    let mut text = format!("--- {} ---\n", source);

    match entries.first() {
        Some(Value::Object(_)) => {
            text.push_str(&format!("Found {} items:\n", entries.len()));
            for (i, entry) in entries.iter().take(ENTRIES_DICT_MAX).enumerate() {
                text.push_str(&format!("Item {}:\n", i + 1));
                if let Some(obj) = entry.as_object() {
                    for (key, value) in obj {
                        if !value.is_object() && !value.is_array() {
                            text.push_str(&format!("  {}: {}\n", key, scalar_display(value)));
                        }
                    }
                }
            }
        }
        Some(_) => {
            text.push_str(&format!("Data points ({}):\n", entries.len()));
            for (i, entry) in entries.iter().take(ENTRIES_SCALAR_MAX).enumerate() {
                text.push_str(&format!("{}. {}\n", i + 1, truncate_text(&scalar_display(entry), 200)));
            }
        }
        None => {
            text.push_str("Empty list\n");
        }
    }

    text
}

/// 标量值的显示形式（字符串不带引号）
fn scalar_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn field_str<'a>(record: &'a Map<String, Value>, key: &str) -> &'a str {
    record.get(key).and_then(|v| v.as_str()).unwrap_or("N/A")
}

/// 构建成分分析提示词
fn build_analysis_prompt(ingredient: &str, combined_data: &str) -> String {
    format!(
        r#"Task: Analyze food ingredient data and provide a structured assessment.

Ingredient: {ingredient}

Based on the following data sources, provide:
1. Safety rating (scale 1-10, where 1=unsafe for consumption, 5=moderate concerns, 10=very safe)
2. List of potential health effects (both positive & negative, maximum 5 points)
3. Brief description of what this ingredient is, how it's used, and its properties
4. Alternative names for this ingredient
5. Allergic information of the ingredient like which type of allergies we can got, etc.
6. Diet Type of that ingredient like Vegan, Vegetarian, Non-Vegetarian

Available data:
{combined_data}

Format your response as a JSON object with these keys:
- "safety_rating": (number between 1-10)
- "health_effects": (array of strings)
- "description": (string)
- "alternate_names": (array of strings)
- "allergic_info": (array of strings)
- "diet_type" : (string from vegan,vegetarian,non-vegetarian,unknown)

Only include factual information supported by the provided data. If information is
unavailable for any field, use appropriate default values. But if information is too obvious
you can fill appropriate information just make sure only relevant data is there in the output."#
    )
}
