//! 从自由文本中提取 JSON - 工具模块
//!
//! LLM 的响应常在 JSON 对象前后夹杂说明性文字，本模块提供
//! "尽力而为"的结构化提取：取文本中第一个顶层 `{...}` 区间。
//!
//! ## 有损契约
//!
//! - 只识别第一个顶层对象，之后的内容一律忽略
//! - 前缀文本中若出现裸 `{`，提取会从该处开始（调用方自行承担解析失败）
//! - 提取出的区间仍需经 serde 解析，本模块不保证其为合法 JSON

/// 返回文本中第一个顶层 `{...}` 区间
///
/// 扫描时跳过字符串字面量内部的花括号和转义字符；
/// 找不到完整对象时返回 `None`
pub fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// 提取并解析第一个顶层 JSON 对象
///
/// 区分两种失败：找不到区间（`NoJsonFound`）与区间解析失败（`ParseFailed`）
pub fn extract_object(text: &str) -> Result<serde_json::Value, ExtractError> {
    let span = first_object_span(text).ok_or(ExtractError::NoJsonFound)?;
    serde_json::from_str(span).map_err(|e| ExtractError::ParseFailed(e.to_string()))
}

/// JSON 提取失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// 文本中没有完整的 `{...}` 区间
    NoJsonFound,
    /// 区间不是合法 JSON
    ParseFailed(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::NoJsonFound => write!(f, "响应中未找到 JSON 对象"),
            ExtractError::ParseFailed(e) => write!(f, "JSON 解析失败: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}
