//! 翻译缓存模块
//!
//! 缓存按 `(原文, 目标语言)` 内容寻址，与产生译文的供应商无关。
//! 引擎只依赖 [`TranslationCache`] 这一键值契约，具体存储由调用方提供。

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::translation::config::constants;
use crate::translation::error::TranslationResult;

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存键：`blake3(text ‖ 0x00 ‖ lang)` 的十六进制前 32 位
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(text: &str, target_lang: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(text.as_bytes());
        hasher.update(&[0]);
        hasher.update(target_lang.as_bytes());
        let hex = hasher.finalize().to_hex();
        Self(hex[..32].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: CacheKey,
    pub source_text: String,
    pub translated_text: String,
    pub target_lang: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// 创建新的缓存条目，键由原文和目标语言推导
    pub fn new(source_text: &str, translated_text: &str, target_lang: &str, provider: &str) -> Self {
        Self {
            hash: CacheKey::new(source_text, target_lang),
            source_text: source_text.to_string(),
            translated_text: translated_text.to_string(),
            target_lang: target_lang.to_string(),
            provider: provider.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// 翻译缓存契约
///
/// 同一键的并发写入以最后一次为准；不同键之间的写入互不影响。
pub trait TranslationCache: Send + Sync {
    /// 按键查找译文，存储层故障视为未命中
    fn lookup(&self, key: &CacheKey) -> Option<String>;

    /// 插入或覆盖条目
    fn store(&self, entry: &CacheEntry) -> TranslationResult<()>;
}

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }

    /// 重置统计信息
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// 内存实现
// ============================================================================

struct MemoryInner {
    entries: LruCache<CacheKey, CacheEntry>,
    stats: CacheStats,
}

/// 有界 LRU 内存缓存
pub struct MemoryCache {
    inner: Mutex<MemoryInner>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(constants::DEFAULT_CACHE_CAPACITY)
    }

    /// 容量为 0 时按 1 处理
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(MemoryInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 获取完整条目（不计入统计）
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().entries.peek(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.total_entries = 0;
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = inner.stats.clone();
        stats.total_entries = inner.entries.len();
        stats
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationCache for MemoryCache {
    fn lookup(&self, key: &CacheKey) -> Option<String> {
        let mut inner = self.lock();
        inner.stats.total_requests += 1;

        let hit = inner.entries.get(key).map(|e| e.translated_text.clone());
        match hit {
            Some(text) => {
                inner.stats.cache_hits += 1;
                Some(text)
            }
            None => {
                inner.stats.cache_misses += 1;
                None
            }
        }
    }

    fn store(&self, entry: &CacheEntry) -> TranslationResult<()> {
        let mut inner = self.lock();
        if let Some((evicted, _)) = inner.entries.push(entry.hash.clone(), entry.clone()) {
            if evicted != entry.hash {
                inner.stats.evictions += 1;
            }
        }
        inner.stats.total_entries = inner.entries.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic_and_lang_scoped() {
        let a = CacheKey::new("Hello", "zh-CN");
        let b = CacheKey::new("Hello", "zh-CN");
        let c = CacheKey::new("Hello", "ja");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_key_separator_prevents_ambiguity() {
        // "ab" + "c" 与 "a" + "bc" 不能碰撞
        assert_ne!(CacheKey::new("ab", "c"), CacheKey::new("a", "bc"));
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = MemoryCache::new();
        let entry = CacheEntry::new("hello", "你好", "zh-CN", "qwen");

        cache.store(&entry).unwrap();
        assert_eq!(cache.lookup(&CacheKey::new("hello", "zh-CN")), Some("你好".to_string()));
        assert_eq!(cache.lookup(&CacheKey::new("world", "zh-CN")), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let cache = MemoryCache::new();
        cache.store(&CacheEntry::new("hello", "你好", "zh-CN", "qwen")).unwrap();
        cache.store(&CacheEntry::new("hello", "哈喽", "zh-CN", "openai")).unwrap();

        let key = CacheKey::new("hello", "zh-CN");
        assert_eq!(cache.lookup(&key), Some("哈喽".to_string()));
        assert_eq!(cache.entry(&key).unwrap().provider, "openai");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_stats().evictions, 0);
    }

    #[test]
    fn test_cache_stats() {
        let cache = MemoryCache::new();
        cache.store(&CacheEntry::new("hello", "你好", "zh-CN", "qwen")).unwrap();

        cache.lookup(&CacheKey::new("hello", "zh-CN"));
        cache.lookup(&CacheKey::new("world", "zh-CN"));

        let stats = cache.get_stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = MemoryCache::with_capacity(2);
        cache.store(&CacheEntry::new("1", "一", "zh-CN", "qwen")).unwrap();
        cache.store(&CacheEntry::new("2", "二", "zh-CN", "qwen")).unwrap();

        // 访问第一个，使其成为最近使用的
        cache.lookup(&CacheKey::new("1", "zh-CN"));
        cache.store(&CacheEntry::new("3", "三", "zh-CN", "qwen")).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup(&CacheKey::new("1", "zh-CN")), Some("一".to_string()));
        assert_eq!(cache.lookup(&CacheKey::new("2", "zh-CN")), None);
        assert_eq!(cache.get_stats().evictions, 1);
    }
}
