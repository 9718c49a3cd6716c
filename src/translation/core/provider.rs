//! 翻译供应商
//!
//! 所有内置供应商都暴露 OpenAI 兼容的 `chat/completions` 接口，
//! 因此只需要一个基于 reqwest 的实现。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::translation::config::{constants, ProviderConfig, TranslationConfig};
use crate::translation::error::{TranslationError, TranslationResult};

/// 远程翻译供应商
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// 供应商名称，写入缓存条目
    fn name(&self) -> &str;

    /// 发送一次补全请求，返回去除首尾空白的文本
    async fn complete(&self, system_prompt: &str, text: &str) -> TranslationResult<String>;

    /// 释放连接资源，可重复调用
    fn close(&self) {}
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI 兼容接口的供应商实现
pub struct OpenAiCompatibleProvider {
    config: ProviderConfig,
    timeout: Duration,
    client: Mutex<Option<reqwest::Client>>,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: ProviderConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// 懒加载 HTTP 客户端
    fn client(&self) -> TranslationResult<reqwest::Client> {
        let mut slot = self.client.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TranslationError::NetworkError(format!("创建HTTP客户端失败: {}", e)))?;
        *slot = Some(client.clone());
        Ok(client)
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl TranslationProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, system_prompt: &str, text: &str) -> TranslationResult<String> {
        let client = self.client()?;
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: constants::DEFAULT_TEMPERATURE,
        };

        let mut request = client.post(self.config.endpoint()).json(&body);
        if let Some(key) = self.api_key() {
            request = request.bearer_auth(key);
        }

        tracing::debug!(
            "发送翻译请求: {} ({} 字符)",
            self.config.name,
            text.chars().count()
        );

        let response = request
            .send()
            .await
            .map_err(|e| TranslationError::NetworkError(format!("{}: {}", self.config.name, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            tracing::error!("翻译服务返回错误 {} {}: {}", self.config.name, status, excerpt);
            return Err(TranslationError::ServiceError(format!(
                "{} 返回 HTTP {}",
                self.config.name, status
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslationError::ParseError(format!("{}: {}", self.config.name, e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                TranslationError::ParseError(format!(
                    "{} 响应缺少 choices[0].message.content",
                    self.config.name
                ))
            })
    }

    fn close(&self) {
        let mut slot = self.client.lock().unwrap_or_else(|p| p.into_inner());
        if slot.take().is_some() {
            tracing::debug!("已关闭翻译供应商连接: {}", self.config.name);
        }
    }
}

/// 根据配置创建当前供应商，配置不完整时返回 `None`
pub fn build_provider(config: &TranslationConfig) -> Option<Arc<dyn TranslationProvider>> {
    let provider = config.active_provider()?;
    if !provider.is_configured() {
        return None;
    }
    Some(Arc::new(OpenAiCompatibleProvider::new(
        provider.clone(),
        config.request_timeout(),
    )))
}
