//! Open Food Facts 成分库 - 数据源层
//!
//! 两段式查询：先按成分 slug 查成分条目，
//! 未命中时退回产品标签搜索（结果标记为独立的数据源标识）

use async_trait::async_trait;
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{SourceId, SourcePayload, SourceResult};
use crate::sources::SourceAdapter;

/// 单次请求超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 产品标签搜索的每页条数
const PRODUCT_PAGE_SIZE: u32 = 5;

/// Open Food Facts 适配器
pub struct OpenFoodFactsSource {
    client: Client,
    api_base_url: String,
}

impl OpenFoodFactsSource {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.open_food_facts_api_base_url.clone(),
        }
    }

    /// 成分条目 slug：小写、空格转连字符
    fn ingredient_slug(ingredient: &str) -> String {
        ingredient.trim().to_lowercase().replace(' ', "-")
    }

    /// 产品搜索标签：小写、空格转下划线
    fn ingredient_tag(ingredient: &str) -> String {
        ingredient.trim().to_lowercase().replace(' ', "_")
    }

    /// 按 slug 查成分条目，404 或 status!=1 视为未命中
    async fn lookup_ingredient(&self, ingredient: &str) -> Result<Option<Map<String, Value>>> {
        let url = format!(
            "{}/ingredient/{}.json",
            self.api_base_url,
            Self::ingredient_slug(ingredient)
        );

        let response = self
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Open Food Facts 请求失败")?;

        if response.status() != StatusCode::OK {
            return Ok(None);
        }

        let body: Value = response
            .json()
            .await
            .context("Open Food Facts 响应解析失败")?;

        if body.get("status").and_then(|s| s.as_i64()) != Some(1) {
            return Ok(None);
        }

        Ok(body.as_object().cloned())
    }

    /// 兜底：按成分标签搜索含有该成分的产品
    async fn search_products(&self, ingredient: &str) -> Result<Option<Map<String, Value>>> {
        let url = format!("{}/search.json", self.api_base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ingredients_tags", Self::ingredient_tag(ingredient)),
                ("page_size", PRODUCT_PAGE_SIZE.to_string()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Open Food Facts 产品搜索请求失败")?;

        if response.status() != StatusCode::OK {
            return Ok(None);
        }

        let body: Value = response
            .json()
            .await
            .context("Open Food Facts 产品搜索响应解析失败")?;

        if body.get("count").and_then(|c| c.as_i64()).unwrap_or(0) <= 0 {
            return Ok(None);
        }

        Ok(body.as_object().cloned())
    }
}

#[async_trait]
impl SourceAdapter for OpenFoodFactsSource {
    fn id(&self) -> SourceId {
        SourceId::OpenFoodFacts
    }

    async fn fetch(&self, ingredient: &str) -> SourceResult {
        info!("搜索 Open Food Facts: {}", ingredient);

        // 第一段：成分条目
        match self.lookup_ingredient(ingredient).await {
            Ok(Some(record)) => {
                return SourceResult::found(
                    SourceId::OpenFoodFacts,
                    SourcePayload::Record(record),
                );
            }
            Ok(None) => {
                debug!("Open Food Facts 成分条目未命中，退回产品搜索: {}", ingredient);
            }
            Err(e) => {
                warn!("Open Food Facts 成分查询失败: {:#}", e);
                return SourceResult::failed(SourceId::OpenFoodFacts, format!("{:#}", e));
            }
        }

        // 第二段：产品标签搜索，命中时用独立标识标记来源
        match self.search_products(ingredient).await {
            Ok(Some(record)) => SourceResult::found(
                SourceId::OpenFoodFactsProducts,
                SourcePayload::Record(record),
            ),
            Ok(None) => SourceResult::not_found(SourceId::OpenFoodFacts),
            Err(e) => {
                warn!("Open Food Facts 产品搜索失败: {:#}", e);
                SourceResult::failed(SourceId::OpenFoodFacts, format!("{:#}", e))
            }
        }
    }
}
