//! 内置供应商表

use serde::{Deserialize, Serialize};

use crate::translation::error::{TranslationError, TranslationResult};

/// 内置供应商定义
#[derive(Debug, Clone, Copy)]
pub struct ProviderDef {
    pub name: &'static str,
    pub default_base_url: &'static str,
    pub default_model: &'static str,
    pub requires_api_key: bool,
}

impl ProviderDef {
    pub fn to_config(&self) -> ProviderConfig {
        ProviderConfig {
            name: self.name.to_string(),
            api_key: None,
            base_url: self.default_base_url.to_string(),
            model: self.default_model.to_string(),
            requires_api_key: self.requires_api_key,
        }
    }
}

/// 所有供应商都使用 OpenAI 兼容的 chat/completions 接口
pub const PROVIDER_DEFS: &[ProviderDef] = &[
    ProviderDef {
        name: "openai",
        default_base_url: "https://api.openai.com/v1",
        default_model: "gpt-4o-mini",
        requires_api_key: true,
    },
    ProviderDef {
        name: "claude",
        default_base_url: "https://api.anthropic.com/v1",
        default_model: "claude-sonnet-4-20250514",
        requires_api_key: true,
    },
    ProviderDef {
        name: "qwen",
        default_base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1",
        default_model: "qwen-plus",
        requires_api_key: true,
    },
    ProviderDef {
        name: "glm",
        default_base_url: "https://open.bigmodel.cn/api/paas/v4",
        default_model: "glm-4-flash",
        requires_api_key: true,
    },
    ProviderDef {
        name: "openrouter",
        default_base_url: "https://openrouter.ai/api/v1",
        default_model: "google/gemini-2.0-flash-001",
        requires_api_key: true,
    },
    ProviderDef {
        name: "ollama",
        default_base_url: "http://localhost:11434/v1",
        default_model: "qwen2.5:7b",
        requires_api_key: false,
    },
];

/// 单个供应商的连接配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub requires_api_key: bool,
}

impl ProviderConfig {
    /// 凭据与端点是否齐全
    pub fn is_configured(&self) -> bool {
        let has_endpoint = !self.base_url.trim().is_empty();
        if !self.requires_api_key {
            return has_endpoint;
        }
        let has_key = self
            .api_key
            .as_deref()
            .map(|key| !key.trim().is_empty())
            .unwrap_or(false);
        has_key && has_endpoint
    }

    /// chat/completions 完整地址
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn env_prefix(&self) -> String {
        self.name.to_uppercase().replace('-', "_")
    }

    /// 读取 `<P>_API_KEY`、`<P>_BASE_URL`、`<P>_MODEL`
    pub fn apply_env_overrides(&mut self) {
        let prefix = self.env_prefix();
        let read = |suffix: &str| {
            std::env::var(format!("{}_{}", prefix, suffix))
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(key) = read("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(base_url) = read("BASE_URL") {
            tracing::debug!("环境变量覆盖 {} 端点: {}", self.name, base_url);
            self.base_url = base_url;
        }
        if let Some(model) = read("MODEL") {
            self.model = model;
        }
    }

    /// 端点必须是合法的 http(s) 地址
    pub fn validate(&self) -> TranslationResult<()> {
        if self.base_url.trim().is_empty() {
            return Ok(());
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            TranslationError::ConfigError(format!(
                "供应商 {} 的端点无效 '{}': {}",
                self.name, self.base_url, e
            ))
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(TranslationError::ConfigError(format!(
                "供应商 {} 的端点协议不受支持: {}",
                self.name, scheme
            ))),
        }
    }
}
