//! 翻译配置模块
//!
//! 翻译引擎只接受一个构造时传入的不可变 [`TranslationConfig`]，
//! 之后不再读取任何环境状态。

pub mod providers;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::translation::error::{TranslationError, TranslationResult};

pub use providers::{ProviderConfig, ProviderDef, PROVIDER_DEFS};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    /// 批量请求中段落之间的分隔序列
    pub const BATCH_SEPARATOR: &str = "\n---\n";
    /// 拆分响应时使用的标记
    pub const SEGMENT_MARKER: &str = "---";
    /// 响应中独占一行的分隔标记
    pub const SEPARATOR_LINE: &str = r"(?m)^[ \t]*---[ \t]*$";
    /// 单次远程请求最多携带的段落数
    pub const BATCH_MAX_PARAGRAPHS: usize = 20;
    /// 采样温度
    pub const DEFAULT_TEMPERATURE: f32 = 0.3;

    pub const DEFAULT_PROVIDER: &str = "qwen";
    pub const DEFAULT_TARGET_LANG: &str = "zh-CN";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// 内存缓存默认容量
    pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;
}

/// 翻译配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// 当前启用的供应商名称
    pub provider: String,
    pub target_lang: String,
    pub request_timeout_secs: u64,
    pub batch_max_paragraphs: usize,
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        let providers = PROVIDER_DEFS
            .iter()
            .map(|def| (def.name.to_string(), def.to_config()))
            .collect();

        Self {
            provider: constants::DEFAULT_PROVIDER.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            batch_max_paragraphs: constants::BATCH_MAX_PARAGRAPHS,
            providers,
        }
    }
}

impl TranslationConfig {
    /// 创建指定供应商与目标语言的配置
    pub fn new(provider: &str, target_lang: &str) -> Self {
        Self {
            provider: provider.to_lowercase(),
            target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 替换（或新增）一个供应商条目
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.insert(provider.name.clone(), provider);
        self
    }

    /// 当前启用的供应商配置
    pub fn active_provider(&self) -> Option<&ProviderConfig> {
        self.providers.get(&self.provider)
    }

    /// 是否存在可用的供应商
    pub fn is_configured(&self) -> bool {
        self.active_provider()
            .map(ProviderConfig::is_configured)
            .unwrap_or(false)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 补全内置供应商的默认值
    ///
    /// 配置文件中的供应商条目可以只写部分字段，缺失的端点和模型从内置表补齐。
    pub fn fill_provider_defaults(&mut self) {
        for (name, provider) in self.providers.iter_mut() {
            if provider.name.is_empty() {
                provider.name = name.clone();
            }
        }

        for def in PROVIDER_DEFS {
            let entry = self
                .providers
                .entry(def.name.to_string())
                .or_insert_with(|| def.to_config());
            if entry.base_url.trim().is_empty() {
                entry.base_url = def.default_base_url.to_string();
            }
            if entry.model.trim().is_empty() {
                entry.model = def.default_model.to_string();
            }
            entry.requires_api_key = def.requires_api_key;
        }
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvVar};

        if let Some(provider) = translation::Provider::get_if_set() {
            self.provider = provider;
        }

        if let Some(target_lang) = translation::TargetLang::get_if_set() {
            self.target_lang = target_lang;
        }

        if let Some(timeout) = translation::RequestTimeout::get_if_set() {
            self.request_timeout_secs = timeout.as_secs();
        }

        for provider in self.providers.values_mut() {
            provider.apply_env_overrides();
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.batch_max_paragraphs == 0 {
            return Err(TranslationError::ConfigError(
                "批次段落数不能为0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError(
                "请求超时必须大于0".to_string(),
            ));
        }

        if self.target_lang.trim().is_empty() {
            return Err(TranslationError::ConfigError(
                "目标语言不能为空".to_string(),
            ));
        }

        for provider in self.providers.values() {
            provider.validate()?;
        }

        if self.active_provider().is_none() {
            tracing::warn!("未知的翻译供应商: {}", self.provider);
        }

        Ok(())
    }
}
