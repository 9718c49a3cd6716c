//! 翻译模块
//!
//! 采用分层的模块化架构：
//! - **core**: 翻译引擎与远程供应商
//! - **storage**: 内容寻址的翻译缓存
//! - **config**: 供应商表与翻译配置
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bookworm::translation::{MemoryCache, TranslationConfig, TranslationEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = TranslationEngine::new(
//!     TranslationConfig::new("ollama", "zh-CN"),
//!     Arc::new(MemoryCache::new()),
//! );
//! let paragraphs = vec!["Hello".to_string()];
//! let translated = engine.translate_batch(&paragraphs).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块
pub mod config;

/// 核心翻译引擎模块
pub mod core;

/// 错误处理模块
pub mod error;

/// 存储管理模块
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use config::{constants, ProviderConfig, TranslationConfig, PROVIDER_DEFS};
pub use core::{
    build_provider, EngineStats, OpenAiCompatibleProvider, TranslationEngine, TranslationProvider,
};
pub use error::{ErrorCategory, ErrorSeverity, ErrorStats, TranslationError, TranslationResult};
pub use storage::{CacheEntry, CacheKey, CacheStats, MemoryCache, TranslationCache};
