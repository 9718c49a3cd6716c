//! 阅读会话错误

use thiserror::Error;

use crate::document::DocumentError;
use crate::library::StoreError;
use crate::translation::TranslationError;

/// 阅读会话错误
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("翻译供应商 [{provider}] 未配置，请在 .env 中设置 API 密钥")]
    ProviderNotConfigured { provider: String },

    #[error("翻译未完成: {done}/{total}")]
    IncompleteTranslation { done: usize, total: usize },

    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),

    #[error("翻译错误: {0}")]
    Translation(#[from] TranslationError),

    #[error("存储错误: {0}")]
    Store(#[from] StoreError),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// 完成百分比，仅对未完成错误有意义
    pub fn completion_percent(&self) -> Option<usize> {
        match self {
            Self::IncompleteTranslation { done, total } => Some(done * 100 / (*total).max(1)),
            _ => None,
        }
    }
}

pub type ReaderResult<T> = Result<T, ReaderError>;
