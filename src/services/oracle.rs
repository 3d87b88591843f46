//! LLM 推理服务 - 业务能力层
//!
//! 只负责"把提示词发给 LLM、拿回文本"这一件事，
//! 不关心提示词内容，也不解析响应结构
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Gemini, Azure, Doubao 等）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;

/// 推理服务接口
///
/// 综合服务和产品分析服务都通过这个接口调用 LLM，
/// 测试时可注入桩实现
#[async_trait]
pub trait Oracle: Send + Sync {
    /// 发送提示词，返回原始文本响应
    async fn invoke(&self, prompt: &str) -> Result<String>;
}

/// 基于 OpenAI 兼容 API 的推理服务
pub struct LlmOracle {
    client: Client<OpenAIConfig>,
    model_name: String,
    api_key_present: bool,
}

impl LlmOracle {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            api_key_present: !config.llm_api_key.is_empty(),
        }
    }
}

#[async_trait]
impl Oracle for LlmOracle {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        // 未配置密钥时不发起调用，让调用方走降级路径
        if !self.api_key_present {
            anyhow::bail!("LLM API 密钥未配置");
        }

        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("提示词长度: {} 字符", prompt.len());

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            anyhow::anyhow!("LLM API 调用失败: {}", e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| anyhow::anyhow!("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }
}
