//! PubChem 化学数据库 - 数据源层
//!
//! 三步流程：名称解析 CID → 理化属性 → 分类信息。
//! PubChem 对高频访问敏感，因此单次请求超时极短（默认 2 秒），
//! 超时按指数退避重试（5s、10s、20s ...），其他错误不重试

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{SourceId, SourcePayload, SourceResult};
use crate::sources::SourceAdapter;

/// 属性查询包含的字段列表
const PROPERTY_FIELDS: &str =
    "MolecularFormula,MolecularWeight,IUPACName,InChI,InChIKey,CanonicalSMILES";

/// 第 n 次重试前的退避间隔：5 * 2^n 秒
fn backoff_delay(attempt: usize) -> Duration {
    Duration::from_secs(5 * (1u64 << attempt))
}

/// PubChem 适配器
pub struct PubChemSource {
    client: Client,
    api_base_url: String,
    request_timeout: Duration,
    max_retries: usize,
}

impl PubChemSource {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_base_url: config.pubchem_api_base_url.clone(),
            request_timeout: Duration::from_secs(config.pubchem_timeout_secs),
            max_retries: config.pubchem_max_retries,
        }
    }

    /// 带退避重试的 JSON GET
    ///
    /// 仅超时触发重试；非 2xx 状态和其他传输错误直接放弃。
    /// 全部失败时返回 None，调用方将其视为该步骤无数据
    async fn fetch_json(&self, url: &str) -> Option<Value> {
        for attempt in 0..=self.max_retries {
            match self
                .client
                .get(url)
                .timeout(self.request_timeout)
                .send()
                .await
            {
                Ok(response) => {
                    if !response.status().is_success() {
                        debug!("PubChem 返回非成功状态 {}: {}", response.status(), url);
                        return None;
                    }
                    match response.json::<Value>().await {
                        Ok(body) => return Some(body),
                        Err(e) => {
                            debug!("PubChem 响应解析失败: {:#}", e);
                            return None;
                        }
                    }
                }
                Err(e) if e.is_timeout() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "PubChem 请求超时，{} 秒后重试 (第 {}/{} 次)",
                        delay.as_secs(),
                        attempt + 1,
                        self.max_retries
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    debug!("PubChem 请求失败: {:#}", e);
                    return None;
                }
            }
        }
        None
    }

    /// 名称解析化合物 CID
    async fn resolve_cid(&self, ingredient: &str) -> Option<(i64, Value)> {
        let url = format!("{}/compound/name/{}/JSON", self.api_base_url, ingredient);
        let body = self.fetch_json(&url).await?;

        let cid = body
            .get("PC_Compounds")
            .and_then(|c| c.as_array())
            .and_then(|compounds| compounds.first())
            .and_then(|compound| compound.get("id"))
            .and_then(|id| id.get("id"))
            .and_then(|id| id.get("cid"))
            .and_then(|cid| cid.as_i64())?;

        Some((cid, body))
    }

    /// 三步查询，任一后续步骤失败不影响已取得的数据
    async fn lookup(&self, ingredient: &str) -> Option<Map<String, Value>> {
        let (cid, compound_info) = self.resolve_cid(ingredient).await?;
        debug!("PubChem 解析到 CID: {}", cid);

        let property_url = format!(
            "{}/compound/cid/{}/property/{}/JSON",
            self.api_base_url, cid, PROPERTY_FIELDS
        );
        let classification_url = format!(
            "{}/compound/cid/{}/classification/JSON",
            self.api_base_url, cid
        );

        let properties = self.fetch_json(&property_url).await;
        let classification = self.fetch_json(&classification_url).await;

        let mut record = Map::new();
        record.insert("compound_info".to_string(), compound_info);
        record.insert(
            "properties".to_string(),
            properties.unwrap_or_else(|| json!(null)),
        );
        record.insert(
            "classification".to_string(),
            classification.unwrap_or_else(|| json!(null)),
        );

        Some(record)
    }
}

#[async_trait]
impl SourceAdapter for PubChemSource {
    fn id(&self) -> SourceId {
        SourceId::PubChem
    }

    async fn fetch(&self, ingredient: &str) -> SourceResult {
        info!("搜索 PubChem: {}", ingredient);

        match self.lookup(ingredient).await {
            Some(record) => {
                SourceResult::found(SourceId::PubChem, SourcePayload::Record(record))
            }
            None => SourceResult::not_found(SourceId::PubChem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_from_five_seconds() {
        assert_eq!(backoff_delay(0), Duration::from_secs(5));
        assert_eq!(backoff_delay(1), Duration::from_secs(10));
        assert_eq!(backoff_delay(2), Duration::from_secs(20));
    }
}
