//! Wikipedia 百科查询 - 数据源层
//!
//! 先查原始名称，摘要过短（<100 字符）时依次尝试两个细化查询：
//! "<name> food additive"、"<name> chemical compound"，
//! 第一个足够长的摘要即为结果

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{SourceId, SourcePayload, SourceResult};
use crate::sources::SourceAdapter;

/// 摘要被视为"有实质内容"的最小长度
const MIN_SUBSTANTIAL_LEN: usize = 100;

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wikipedia 适配器
pub struct WikipediaSource {
    client: Client,
    api_base_url: String,
}

impl WikipediaSource {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.wikipedia_api_base_url.clone(),
        }
    }

    /// 依次尝试原始查询与两个细化查询
    async fn lookup(&self, ingredient: &str) -> Result<Option<String>> {
        let queries = [
            ingredient.to_string(),
            format!("{} food additive", ingredient),
            format!("{} chemical compound", ingredient),
        ];

        for query in &queries {
            if let Some(extract) = self.query_extract(query).await? {
                if extract.chars().count() > MIN_SUBSTANTIAL_LEN {
                    return Ok(Some(extract));
                }
                debug!("Wikipedia 摘要过短，尝试细化查询: {}", query);
            }
        }

        Ok(None)
    }

    /// 搜索并取回第一个页面的纯文本摘要
    async fn query_extract(&self, query: &str) -> Result<Option<String>> {
        let response: Value = self
            .client
            .get(&self.api_base_url)
            .query(&[
                ("action", "query"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", "1"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Wikipedia 请求失败")?
            .error_for_status()
            .context("Wikipedia 返回错误状态")?
            .json()
            .await
            .context("Wikipedia 响应解析失败")?;

        let extract = response
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|pages| pages.as_object())
            .and_then(|pages| pages.values().next())
            .and_then(|page| page.get("extract"))
            .and_then(|e| e.as_str())
            .map(|s| s.to_string());

        Ok(extract)
    }
}

#[async_trait]
impl SourceAdapter for WikipediaSource {
    fn id(&self) -> SourceId {
        SourceId::Wikipedia
    }

    async fn fetch(&self, ingredient: &str) -> SourceResult {
        info!("搜索 Wikipedia: {}", ingredient);

        match self.lookup(ingredient).await {
            Ok(Some(extract)) => {
                SourceResult::found(SourceId::Wikipedia, SourcePayload::Text(extract))
            }
            Ok(None) => SourceResult::not_found(SourceId::Wikipedia),
            Err(e) => {
                warn!("Wikipedia 查询失败: {:#}", e);
                SourceResult::failed(SourceId::Wikipedia, format!("{:#}", e))
            }
        }
    }
}
