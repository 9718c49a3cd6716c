//! 翻译引擎核心实现
//!
//! 引擎以缓存优先的方式翻译段落：空白段落直接返回空串，缓存命中直接返回，
//! 其余段落合并为一次远程请求。
//!
//! ## 工作流程
//! 1. 过滤空白段落
//! 2. 逐段查询缓存
//! 3. 未命中的段落去重后用分隔符拼接，发送单次请求
//! 4. 按分隔符拆分响应，数量不足补空串，多余截断
//! 5. 写回缓存后返回，结果与输入等长同序
//!
//! 取消是协作式的：[`TranslationEngine::cancel`] 只设置标志，
//! [`TranslationEngine::translate_all`] 在每个段落和每个分块之前检查它，
//! 已经发出的请求会正常完成并写入缓存。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::core::provider::{build_provider, TranslationProvider};
use crate::translation::error::{helpers, ErrorStats, TranslationError, TranslationResult};
use crate::translation::storage::{CacheEntry, CacheKey, TranslationCache};

/// 翻译引擎
///
/// 引擎的所有方法都只需要 `&self`，可以放进 `Arc` 在多个任务之间共享；
/// 并发的 `translate_batch` 调用各自独立地请求和写缓存。
pub struct TranslationEngine {
    /// 构造时传入的不可变配置
    config: TranslationConfig,
    cache: Arc<dyn TranslationCache>,
    provider: Option<Arc<dyn TranslationProvider>>,
    cancelled: AtomicBool,
    stats: EngineStats,
    errors: Mutex<ErrorStats>,
}

impl TranslationEngine {
    /// 创建新的翻译引擎
    ///
    /// 只有配置完整时才会创建供应商；否则引擎仍可用于查询缓存。
    pub fn new(config: TranslationConfig, cache: Arc<dyn TranslationCache>) -> Self {
        let provider = build_provider(&config);
        if provider.is_none() {
            tracing::info!("翻译供应商 {} 未配置，仅使用缓存", config.provider);
        }
        Self::build(config, cache, provider)
    }

    /// 使用指定供应商创建引擎
    pub fn with_provider(
        config: TranslationConfig,
        cache: Arc<dyn TranslationCache>,
        provider: Arc<dyn TranslationProvider>,
    ) -> Self {
        Self::build(config, cache, Some(provider))
    }

    fn build(
        config: TranslationConfig,
        cache: Arc<dyn TranslationCache>,
        provider: Option<Arc<dyn TranslationProvider>>,
    ) -> Self {
        Self {
            config,
            cache,
            provider,
            cancelled: AtomicBool::new(false),
            stats: EngineStats::default(),
            errors: Mutex::new(ErrorStats::default()),
        }
    }

    /// 是否有可用的供应商
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn target_lang(&self) -> &str {
        &self.config.target_lang
    }

    pub fn provider_name(&self) -> &str {
        self.provider
            .as_ref()
            .map(|p| p.name())
            .unwrap_or(self.config.provider.as_str())
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // 取消
    // ------------------------------------------------------------------

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn reset_cancel(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // 缓存查询
    // ------------------------------------------------------------------

    /// 查询缓存译文，空白段落返回空串
    pub fn get_cached(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return Some(String::new());
        }
        self.cache
            .lookup(&CacheKey::new(text, &self.config.target_lang))
    }

    /// 段落是否已有译文，空白段落视为已翻译
    pub fn is_translated(&self, text: &str) -> bool {
        self.get_cached(text).is_some()
    }

    pub fn count_translated(&self, paragraphs: &[String]) -> usize {
        paragraphs.iter().filter(|p| self.is_translated(p)).count()
    }

    // ------------------------------------------------------------------
    // 翻译
    // ------------------------------------------------------------------

    /// 批量翻译段落
    ///
    /// 返回值与输入等长同序。所有缓存未命中的段落去重后合并为一次远程请求；
    /// 没有未命中时不会访问网络，也不要求供应商已配置。
    ///
    /// # 错误
    /// - `TranslationError::NotConfigured`: 存在未命中但没有供应商
    /// - 供应商返回的网络、服务或解析错误，只影响本批次
    pub async fn translate_batch(&self, paragraphs: &[String]) -> TranslationResult<Vec<String>> {
        self.stats.batches_processed.fetch_add(1, Ordering::Relaxed);

        let mut results = vec![String::new(); paragraphs.len()];
        let mut unique: Vec<&str> = Vec::new();
        let mut slots: HashMap<&str, Vec<usize>> = HashMap::new();

        for (i, paragraph) in paragraphs.iter().enumerate() {
            if paragraph.trim().is_empty() {
                continue;
            }

            if let Some(slot) = slots.get_mut(paragraph.as_str()) {
                slot.push(i);
                continue;
            }

            match self.lookup(paragraph) {
                Some(hit) => {
                    self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                    results[i] = hit;
                }
                None => {
                    self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
                    unique.push(paragraph.as_str());
                    slots.insert(paragraph.as_str(), vec![i]);
                }
            }
        }

        if unique.is_empty() {
            return Ok(results);
        }

        let provider = self.provider.as_ref().ok_or_else(|| {
            TranslationError::NotConfigured(self.config.provider.clone())
        })?;

        tracing::debug!(
            "批次 {} 段，缓存未命中 {} 段（去重后）",
            paragraphs.len(),
            unique.len()
        );

        let translations = self.request_translations(provider.as_ref(), &unique).await?;

        for (source, translated) in unique.iter().zip(translations) {
            if let Some(positions) = slots.get(source) {
                for &i in positions {
                    results[i] = translated.clone();
                }
            }
            self.write_back(provider.name(), source, &translated);
        }

        Ok(results)
    }

    /// 翻译整本书的段落
    ///
    /// 先统计已缓存的段落并报告一次进度，然后把剩余段落按
    /// `batch_max_paragraphs` 分块发送；每块完成后报告进度并让出调度。
    /// 取消后不再发送新的分块，已得到的译文保留在缓存中。
    pub async fn translate_all<F>(
        &self,
        paragraphs: &[String],
        mut on_progress: F,
    ) -> TranslationResult<Vec<String>>
    where
        F: FnMut(usize, usize),
    {
        let total = paragraphs.len();
        let mut results = vec![String::new(); total];
        let mut resolved = vec![false; total];
        let mut done = 0;

        for (i, paragraph) in paragraphs.iter().enumerate() {
            if let Some(cached) = self.get_cached(paragraph) {
                results[i] = cached;
                resolved[i] = true;
                done += 1;
            }
        }
        on_progress(done, total);

        let chunk_size = self.config.batch_max_paragraphs.max(1);
        let mut chunk: Vec<usize> = Vec::with_capacity(chunk_size);

        for i in 0..total {
            if self.is_cancelled() {
                tracing::info!("翻译已取消，完成 {}/{}", done, total);
                break;
            }
            if resolved[i] {
                continue;
            }

            chunk.push(i);
            if chunk.len() >= chunk_size {
                done += self.run_chunk(paragraphs, &chunk, &mut results).await?;
                chunk.clear();
                on_progress(done, total);
                tokio::task::yield_now().await;
            }
        }

        if !chunk.is_empty() && !self.is_cancelled() {
            done += self.run_chunk(paragraphs, &chunk, &mut results).await?;
            on_progress(done, total);
        }

        Ok(results)
    }

    async fn run_chunk(
        &self,
        paragraphs: &[String],
        chunk: &[usize],
        results: &mut [String],
    ) -> TranslationResult<usize> {
        let texts: Vec<String> = chunk.iter().map(|&i| paragraphs[i].clone()).collect();
        let translated = self.translate_batch(&texts).await?;
        for (&i, text) in chunk.iter().zip(translated) {
            results[i] = text;
        }
        Ok(chunk.len())
    }

    async fn request_translations(
        &self,
        provider: &dyn TranslationProvider,
        texts: &[&str],
    ) -> TranslationResult<Vec<String>> {
        let prompt = batch_prompt(&self.config.target_lang, texts.len());
        let combined = texts.join(constants::BATCH_SEPARATOR);

        self.stats.remote_calls.fetch_add(1, Ordering::Relaxed);
        self.stats
            .characters_sent
            .fetch_add(combined.chars().count(), Ordering::Relaxed);

        let response = match provider.complete(&prompt, &combined).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.translation_errors.fetch_add(1, Ordering::Relaxed);
                self.errors
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .record_error(&e);
                helpers::log_error(&e);
                return Err(e);
            }
        };

        self.stats
            .characters_received
            .fetch_add(response.chars().count(), Ordering::Relaxed);

        let segments = split_segments(&response, texts.len());
        let missing = segments.iter().filter(|s| s.is_empty()).count();
        if missing > 0 {
            self.stats
                .missing_translations
                .fetch_add(missing, Ordering::Relaxed);
            tracing::warn!("翻译结果缺少 {} 段（期望 {}）", missing, texts.len());
        }

        Ok(segments)
    }

    fn lookup(&self, text: &str) -> Option<String> {
        self.cache
            .lookup(&CacheKey::new(text, &self.config.target_lang))
    }

    /// 写回缓存，补齐的空译文同样写入
    fn write_back(&self, provider: &str, source: &str, translated: &str) {
        let entry = CacheEntry::new(source, translated, &self.config.target_lang, provider);
        if let Err(e) = self.cache.store(&entry) {
            tracing::warn!("写入翻译缓存失败: {}", e);
        }
    }

    /// 释放供应商连接资源
    pub fn close(&self) {
        if let Some(provider) = &self.provider {
            provider.close();
        }
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> &EngineStats {
        &self.stats
    }

    /// 获取错误统计快照
    pub fn error_stats(&self) -> ErrorStats {
        self.errors
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// 批量翻译的系统提示词
pub fn batch_prompt(target_lang: &str, count: usize) -> String {
    format!(
        "Translate each paragraph to {}. \
         Paragraphs are separated by a line containing only '{}'. \
         Output translations in the same order, separated by a line containing only '{}'. \
         Keep exactly {} translated paragraphs. \
         Only output translations, no explanations.",
        target_lang,
        constants::SEGMENT_MARKER,
        constants::SEGMENT_MARKER,
        count
    )
}

fn separator_line() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(constants::SEPARATOR_LINE).ok()).as_ref()
}

/// 按独占一行的分隔标记拆分响应，结果恰好 `expected` 段
///
/// 段落内部出现的 `---` 不是分隔符。
pub fn split_segments(response: &str, expected: usize) -> Vec<String> {
    let mut parts: Vec<String> = match separator_line() {
        Some(re) => re.split(response).map(|s| s.trim().to_string()).collect(),
        None => response
            .split(constants::BATCH_SEPARATOR)
            .map(|s| s.trim().to_string())
            .collect(),
    };
    parts.resize(expected, String::new());
    parts
}

/// 翻译引擎统计信息（线程安全版本）
#[derive(Debug, Default)]
pub struct EngineStats {
    /// `translate_batch` 调用次数
    pub batches_processed: AtomicUsize,
    /// 实际发出的远程请求数
    pub remote_calls: AtomicUsize,
    pub cache_hits: AtomicUsize,
    pub cache_misses: AtomicUsize,
    pub characters_sent: AtomicUsize,
    pub characters_received: AtomicUsize,
    pub translation_errors: AtomicUsize,
    /// 响应中缺失（补空串）的段数
    pub missing_translations: AtomicUsize,
}

impl EngineStats {
    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// 重置统计信息
    pub fn reset(&self) {
        for counter in [
            &self.batches_processed,
            &self.remote_calls,
            &self.cache_hits,
            &self.cache_misses,
            &self.characters_sent,
            &self.characters_received,
            &self.translation_errors,
            &self.missing_translations,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
