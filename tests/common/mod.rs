// 集成测试公共模块
//
// 提供可编程的模拟供应商、测试文档和临时环境

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use bookworm::document::{Book, Chapter, Document};
use bookworm::translation::{
    constants, MemoryCache, TranslationCache, TranslationConfig, TranslationEngine,
    TranslationError, TranslationProvider, TranslationResult,
};

/// 模拟供应商的应答方式
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// 每段加上 `译:` 前缀
    Echo,
    /// 固定返回同一段文本
    Fixed(String),
    /// 请求中包含该文本时返回服务错误，否则同 Echo
    FailOn(String),
}

/// 记录调用次数与请求内容的模拟供应商
pub struct MockProvider {
    behavior: MockBehavior,
    delay: Duration,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Arc<Self> {
        Arc::new(Self::new(MockBehavior::Echo))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 所有请求中的段落（按分隔符拆开）
    pub fn requested_paragraphs(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .flat_map(|r| r.split(constants::BATCH_SEPARATOR).map(str::to_string))
            .collect()
    }

    fn echo_response(text: &str) -> String {
        text.split(constants::BATCH_SEPARATOR)
            .map(echo_translation)
            .collect::<Vec<_>>()
            .join(constants::BATCH_SEPARATOR)
    }
}

/// Echo 模式下单段的译文
pub fn echo_translation(paragraph: &str) -> String {
    format!("译:{}", paragraph)
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _system_prompt: &str, text: &str) -> TranslationResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(text.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.behavior {
            MockBehavior::Echo => Ok(Self::echo_response(text)),
            MockBehavior::Fixed(response) => Ok(response.clone()),
            MockBehavior::FailOn(marker) if text.contains(marker.as_str()) => Err(
                TranslationError::ServiceError("HTTP 500: upstream failure".to_string()),
            ),
            MockBehavior::FailOn(_) => Ok(Self::echo_response(text)),
        }
    }
}

/// 使用模拟供应商和给定缓存的引擎
pub fn engine_with(
    provider: Arc<MockProvider>,
    cache: Arc<dyn TranslationCache>,
) -> Arc<TranslationEngine> {
    Arc::new(TranslationEngine::with_provider(
        TranslationConfig::new("ollama", "zh-CN"),
        cache,
        provider,
    ))
}

/// 使用模拟供应商和内存缓存的引擎
pub fn mock_engine(provider: Arc<MockProvider>) -> Arc<TranslationEngine> {
    engine_with(provider, Arc::new(MemoryCache::new()))
}

/// 没有供应商的引擎，只能查询缓存
pub fn offline_engine(cache: Arc<dyn TranslationCache>) -> Arc<TranslationEngine> {
    Arc::new(TranslationEngine::new(
        TranslationConfig::new("openai", "zh-CN"),
        cache,
    ))
}

/// 测试数据生成器
pub struct TestDataGenerator;

impl TestDataGenerator {
    pub fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// 形如 `c{章}p{段}` 的短段落
    pub fn document(chapters: usize, paragraphs: usize) -> Document {
        Self::document_at(Path::new("/tmp/bookworm-test.txt"), chapters, paragraphs)
    }

    pub fn document_at(path: &Path, chapters: usize, paragraphs: usize) -> Document {
        let book = Book {
            id: Book::make_id(&path.to_string_lossy()),
            file_path: path.to_path_buf(),
            title: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            author: "Unknown".to_string(),
            format: "txt".to_string(),
            file_size: 0,
        };
        let chapters = (0..chapters)
            .map(|c| {
                let paragraphs = (0..paragraphs).map(|p| format!("c{}p{}", c, p)).collect();
                Chapter::new(c, format!("Chapter {}", c + 1), paragraphs)
            })
            .collect();
        Document::from_chapters(book, chapters)
    }

    /// 混合英文与中文的长段落
    pub fn mixed_paragraphs(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                if i % 3 == 0 {
                    format!("第{}段包含中文字符，用来测试宽字符的折行与显示宽度计算。", i)
                } else {
                    format!(
                        "Paragraph {} has several ordinary words that need wrapping across lines, \
                         including a supercalifragilisticexpialidocious token.",
                        i
                    )
                }
            })
            .collect()
    }
}

/// 临时测试环境
pub struct TestEnvironment {
    pub dir: tempfile::TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// 写入一本纯文本书，段落之间用空行分隔
    pub fn write_book(&self, name: &str, paragraphs: &[String]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, paragraphs.join("\n\n")).unwrap();
        path
    }
}
