//! LLM 响应字段读取 - 业务能力层
//!
//! LLM 返回的 JSON 字段类型并不可靠：评分可能是整数、浮点数或数字字符串，
//! 列表字段可能退化成单个字符串。这里对每个字段做逐项类型校验，
//! 单个字段非法只回退该字段的默认值，不影响其他字段

use serde_json::Value;

use crate::models::DietType;

/// 读取字符串字段，缺失或类型不符时返回默认值
pub fn read_string(obj: &Value, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| default.to_string())
}

/// 读取字符串列表字段
///
/// 接受数组（忽略其中的非字符串项）或单个字符串（包装为单元素列表）
pub fn read_string_list(obj: &Value, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// 读取安全评分，接受整数、浮点数或数字字符串，截断到 [1, 10]
pub fn read_rating(obj: &Value, key: &str, default: u8) -> u8 {
    let raw = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(value) => (value.round() as i64).clamp(1, 10) as u8,
        None => default,
    }
}

/// 读取浮点评分，截断到 [1.0, 10.0]
pub fn read_score(obj: &Value, key: &str, default: f64) -> f64 {
    let raw = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(value) => value.clamp(1.0, 10.0),
        None => default,
    }
}

/// 读取饮食类型，接受单个字符串或字符串数组
///
/// 数组时取其中约束最严格的可识别类型
/// （non-vegetarian > vegetarian > vegan）
pub fn read_diet(obj: &Value, key: &str) -> DietType {
    match obj.get(key) {
        Some(Value::String(s)) => DietType::parse(s),
        Some(Value::Array(items)) => {
            let parsed: Vec<DietType> = items
                .iter()
                .filter_map(|v| v.as_str())
                .map(DietType::parse)
                .filter(|d| *d != DietType::Unknown)
                .collect();
            if parsed.is_empty() {
                DietType::Unknown
            } else if parsed.contains(&DietType::NonVegetarian) {
                DietType::NonVegetarian
            } else if parsed.contains(&DietType::Vegetarian) {
                DietType::Vegetarian
            } else {
                DietType::Vegan
            }
        }
        _ => DietType::Unknown,
    }
}
