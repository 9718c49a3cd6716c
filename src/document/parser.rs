//! 解析器注册表
//!
//! 按扩展名静态分派，在加载时确定一次解析器。

use std::path::{Path, PathBuf};

use tokio::task;

use crate::document::text::{MarkdownParser, TxtParser};
use crate::document::{Book, Document, DocumentError, DocumentResult};

/// 格式解析器
pub trait DocumentParser: Send + Sync {
    /// 格式名，写入 [`Book::format`]
    fn format(&self) -> &'static str;

    /// 支持的小写扩展名（含点号）
    fn extensions(&self) -> &'static [&'static str];

    fn parse(&self, path: &Path) -> DocumentResult<Document>;

    fn can_handle(&self, path: &Path) -> bool {
        let ext = extension_of(path);
        self.extensions().iter().any(|e| *e == ext)
    }
}

/// 解析器注册表
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// 内置的纯文本与 Markdown 解析器
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(MarkdownParser));
        registry.register(Box::new(TxtParser));
        registry
    }

    pub fn register(&mut self, parser: Box<dyn DocumentParser>) {
        self.parsers.push(parser);
    }

    pub fn supported_extensions(&self) -> Vec<&'static str> {
        self.parsers
            .iter()
            .flat_map(|p| p.extensions().iter().copied())
            .collect()
    }

    pub fn parser_for(&self, path: &Path) -> DocumentResult<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.can_handle(path))
            .map(|p| p.as_ref())
            .ok_or_else(|| DocumentError::UnsupportedFormat {
                extension: extension_of(path),
                supported: self.supported_extensions().join(", "),
            })
    }

    /// 同步解析，全部成功或整体失败
    pub fn parse(&self, path: &Path) -> DocumentResult<Document> {
        if !path.exists() {
            return Err(DocumentError::FileMissing(path.to_path_buf()));
        }
        let parser = self.parser_for(path)?;
        tracing::debug!("使用 {} 解析器: {}", parser.format(), path.display());
        parser.parse(path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 在阻塞线程池中加载文档
pub async fn load_document(path: impl Into<PathBuf>) -> DocumentResult<Document> {
    let path = path.into();
    let document = task::spawn_blocking(move || ParserRegistry::with_defaults().parse(&path))
        .await
        .map_err(|e| DocumentError::Parse(format!("解析任务失败: {}", e)))??;

    tracing::info!(
        "已加载《{}》: {} 章 {} 段",
        document.book.title,
        document.chapter_count(),
        document.paragraph_count()
    );
    Ok(document)
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// 读取文件并生成书籍元数据，非法 UTF-8 以替换字符处理
pub(crate) fn read_source(path: &Path, format: &str) -> DocumentResult<(Book, String)> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DocumentError::FileMissing(path.to_path_buf()),
        _ => DocumentError::Io(e),
    })?;
    let text = String::from_utf8_lossy(&bytes).into_owned();

    let book = Book {
        id: Book::make_id(&path.to_string_lossy()),
        file_path: path.to_path_buf(),
        title: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        author: "Unknown".to_string(),
        format: format.to_string(),
        file_size: bytes.len() as u64,
    };
    Ok((book, text))
}
