//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// 未配置可用的翻译供应商
    #[error("翻译供应商未配置: {0}")]
    NotConfigured(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 翻译服务返回了失败状态
    #[error("翻译服务错误: {0}")]
    ServiceError(String),

    /// 响应解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::NetworkError(_) => true,
            TranslationError::ServiceError(_) => true,
            TranslationError::CacheError(_) => true,
            TranslationError::NotConfigured(_) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::ParseError(_) => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::NotConfigured(_) => ErrorSeverity::Info,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::ServiceError(_) => ErrorSeverity::Error,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::CacheError(_) => ErrorSeverity::Warning,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::NotConfigured(_) | TranslationError::ConfigError(_) => {
                ErrorCategory::Configuration
            }
            TranslationError::NetworkError(_) => ErrorCategory::Network,
            TranslationError::ServiceError(_) => ErrorCategory::Service,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::CacheError(_) => ErrorCategory::Cache,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Parsing,
    Cache,
    Internal,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::ParseError(format!("响应解码失败: {}", error))
        } else if let Some(status) = error.status() {
            TranslationError::ServiceError(format!("HTTP {}: {}", status, error))
        } else {
            TranslationError::NetworkError(error.to_string())
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<tokio::task::JoinError> for TranslationError {
    fn from(error: tokio::task::JoinError) -> Self {
        TranslationError::InternalError(format!("后台任务失败: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 引擎累计的错误统计
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_category: HashMap<ErrorCategory, usize>,
    /// 其中可重试的错误数
    pub retryable_errors: usize,
    /// 最近一次错误的描述
    pub last_error: Option<String>,
}

impl ErrorStats {
    pub fn record_error(&mut self, error: &TranslationError) {
        self.total_errors += 1;
        *self.by_category.entry(error.category()).or_insert(0) += 1;
        if error.is_retryable() {
            self.retryable_errors += 1;
        }
        self.last_error = Some(error.to_string());
    }

    pub fn count(&self, category: ErrorCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

pub mod helpers {
    use super::*;

    /// 按严重程度记录日志
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error | ErrorSeverity::Critical => {
                tracing::error!("翻译错误: {}", error)
            }
        }
    }

    /// 存储层故障转为缓存错误
    pub fn cache_error<T: fmt::Display>(error: T) -> TranslationError {
        TranslationError::CacheError(error.to_string())
    }
}
