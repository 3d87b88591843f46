//! USDA FoodData Central 营养数据库 - 数据源层

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{SourceId, SourcePayload, SourceResult};
use crate::sources::SourceAdapter;

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 返回的食品条目上限
const PAGE_SIZE: u32 = 5;

/// USDA 适配器
pub struct UsdaSource {
    client: Client,
    api_base_url: String,
    api_key: String,
}

impl UsdaSource {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.usda_api_base_url.clone(),
            api_key: config.usda_api_key.clone(),
        }
    }

    /// 食品搜索，totalHits > 0 即命中
    async fn search(&self, ingredient: &str) -> Result<Option<Map<String, Value>>> {
        let url = format!("{}/foods/search", self.api_base_url);
        let page_size = PAGE_SIZE.to_string();

        let body: Value = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", ingredient),
                ("pageSize", page_size.as_str()),
                ("dataType", "Foundation,SR Legacy,Branded"),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("USDA 请求失败")?
            .error_for_status()
            .context("USDA 返回错误状态")?
            .json()
            .await
            .context("USDA 响应解析失败")?;

        if body.get("totalHits").and_then(|h| h.as_i64()).unwrap_or(0) <= 0 {
            return Ok(None);
        }

        Ok(body.as_object().cloned())
    }
}

#[async_trait]
impl SourceAdapter for UsdaSource {
    fn id(&self) -> SourceId {
        SourceId::Usda
    }

    async fn fetch(&self, ingredient: &str) -> SourceResult {
        info!("搜索 USDA FoodData Central: {}", ingredient);

        match self.search(ingredient).await {
            Ok(Some(record)) => {
                SourceResult::found(SourceId::Usda, SourcePayload::Record(record))
            }
            Ok(None) => SourceResult::not_found(SourceId::Usda),
            Err(e) => {
                warn!("USDA 查询失败: {:#}", e);
                SourceResult::failed(SourceId::Usda, format!("{:#}", e))
            }
        }
    }
}
