//! 存储模块
//!
//! 提供翻译缓存契约与内存实现，持久化实现见 [`crate::library::RedbStore`]。

pub mod cache;

pub use cache::{CacheEntry, CacheKey, CacheStats, MemoryCache, TranslationCache};
