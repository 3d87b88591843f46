//! DuckDuckGo 网页搜索 - 数据源层
//!
//! 按四个固定模板顺序查询（安全性 / E 编号 / 过敏信息 / 饮食分类），
//! 每次查询前强制等待配置的间隔以遵守搜索方的隐式频率限制。
//! 聚合所有非空结果，任意一条非空即视为命中

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{SourceId, SourcePayload, SourceResult};
use crate::sources::SourceAdapter;

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// DuckDuckGo 适配器
pub struct DuckDuckGoSource {
    client: Client,
    api_base_url: String,
    rate_limit_delay: Duration,
    max_retries: usize,
}

impl DuckDuckGoSource {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.duckduckgo_api_base_url.clone(),
            rate_limit_delay: Duration::from_secs(config.duckduckgo_rate_limit_delay_secs),
            max_retries: config.duckduckgo_max_retries,
        }
    }

    /// 四个固定查询模板
    fn build_queries(ingredient: &str) -> [String; 4] {
        [
            format!("{} food ingredient safety", ingredient),
            format!("{} E-number food additive", ingredient),
            format!("{}'s allergic information", ingredient),
            format!("is {} vegan,vegetarian or Non-vegetarian", ingredient),
        ]
    }

    /// 顺序执行全部查询并聚合非空结果
    async fn search_all(&self, ingredient: &str) -> Result<Vec<Value>> {
        let mut entries = Vec::new();

        for query in Self::build_queries(ingredient) {
            // 每次查询前的强制间隔
            sleep(self.rate_limit_delay).await;

            let text = self.run_query(&query).await?;
            if !text.is_empty() {
                entries.push(json!({ "query": query, "result": text }));
            }
        }

        Ok(entries)
    }

    /// 执行单条查询，传输错误时按配置重试
    async fn run_query(&self, query: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.instant_answer(query).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "DuckDuckGo 查询失败，{} 秒后重试 (第 {}/{} 次): {:#}",
                        self.rate_limit_delay.as_secs(),
                        attempt,
                        self.max_retries,
                        e
                    );
                    sleep(self.rate_limit_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 调用 Instant Answer API，取第一段可用文本
    async fn instant_answer(&self, query: &str) -> Result<String> {
        let response: Value = self
            .client
            .get(&self.api_base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("DuckDuckGo 请求失败")?
            .error_for_status()
            .context("DuckDuckGo 返回错误状态")?
            .json()
            .await
            .context("DuckDuckGo 响应解析失败")?;

        Ok(Self::pick_answer_text(&response))
    }

    /// 按优先级取摘要文本：Abstract → Answer → Definition → 第一条相关主题
    fn pick_answer_text(response: &Value) -> String {
        for key in ["AbstractText", "Answer", "Definition"] {
            if let Some(text) = response.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }

        response
            .get("RelatedTopics")
            .and_then(|topics| topics.as_array())
            .and_then(|topics| {
                topics
                    .iter()
                    .find_map(|topic| topic.get("Text").and_then(|t| t.as_str()))
            })
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl SourceAdapter for DuckDuckGoSource {
    fn id(&self) -> SourceId {
        SourceId::DuckDuckGo
    }

    async fn fetch(&self, ingredient: &str) -> SourceResult {
        info!("搜索 DuckDuckGo: {}", ingredient);

        match self.search_all(ingredient).await {
            Ok(entries) if !entries.is_empty() => {
                debug!("DuckDuckGo 聚合到 {} 条结果", entries.len());
                SourceResult::found(SourceId::DuckDuckGo, SourcePayload::Entries(entries))
            }
            Ok(_) => SourceResult::not_found(SourceId::DuckDuckGo),
            Err(e) => {
                warn!("DuckDuckGo 搜索失败: {:#}", e);
                SourceResult::failed(SourceId::DuckDuckGo, format!("{:#}", e))
            }
        }
    }
}
