//! 文档模型
//!
//! 解析器把各种格式统一为 [`Document`]：有序章节，每章是有序段落，
//! 外加有序目录。文档一经产生即不可变。

pub mod parser;
pub mod text;

use std::fmt::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use parser::{load_document, DocumentParser, ParserRegistry};
pub use text::{MarkdownParser, TxtParser};

/// 文档加载错误
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("文件不存在: {0}")]
    FileMissing(PathBuf),

    #[error("不支持的格式 '{extension}'，支持: {supported}")]
    UnsupportedFormat { extension: String, supported: String },

    #[error("解析失败: {0}")]
    Parse(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// 书籍元数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub file_path: PathBuf,
    pub title: String,
    pub author: String,
    pub format: String,
    pub file_size: u64,
}

impl Book {
    /// 路径的 sha256 前 16 位十六进制
    pub fn make_id(file_path: &str) -> String {
        let digest = Sha256::digest(file_path.as_bytes());
        hex_prefix(&digest, 16)
    }
}

/// 章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub index: usize,
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl Chapter {
    pub fn new(index: usize, title: impl Into<String>, paragraphs: Vec<String>) -> Self {
        Self {
            index,
            title: title.into(),
            paragraphs,
        }
    }
}

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub chapter_index: usize,
    pub title: String,
}

/// 归一化后的文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub book: Book,
    pub chapters: Vec<Chapter>,
    pub toc: Vec<TocEntry>,
}

impl Document {
    /// 由章节生成文档，目录与章节一一对应
    pub fn from_chapters(book: Book, chapters: Vec<Chapter>) -> Self {
        let toc = chapters
            .iter()
            .map(|c| TocEntry {
                chapter_index: c.index,
                title: c.title.clone(),
            })
            .collect();
        Self {
            book,
            chapters,
            toc,
        }
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// 按阅读顺序遍历全部段落
    pub fn paragraphs(&self) -> impl Iterator<Item = &String> {
        self.chapters.iter().flat_map(|c| c.paragraphs.iter())
    }

    pub fn all_paragraphs(&self) -> Vec<String> {
        self.paragraphs().cloned().collect()
    }

    pub fn paragraph_count(&self) -> usize {
        self.chapters.iter().map(|c| c.paragraphs.len()).sum()
    }

    /// 位于 `(chapter, paragraph)` 之前的全部段落
    pub fn paragraphs_before(
        &self,
        chapter: usize,
        paragraph: usize,
    ) -> impl Iterator<Item = &String> {
        let earlier = self.chapters.iter().take(chapter).flat_map(|c| c.paragraphs.iter());
        let current = self
            .chapters
            .get(chapter)
            .into_iter()
            .flat_map(move |c| c.paragraphs.iter().take(paragraph));
        earlier.chain(current)
    }
}

/// 摘要的前 `len` 个十六进制字符
pub(crate) fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let needed = len.div_ceil(2).min(bytes.len());
    let mut hex = String::with_capacity(needed * 2);
    for byte in &bytes[..needed] {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex.truncate(len);
    hex
}
