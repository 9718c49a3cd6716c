//! 阅读进度与书签数据模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::document::hex_prefix;

/// 阅读进度，每本书一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub book_id: String,
    pub chapter_index: usize,
    pub page_index: usize,
    /// 0.0 ..= 1.0
    pub progress_fraction: f64,
    pub updated_at: DateTime<Utc>,
}

impl ReadingProgress {
    pub fn new(
        book_id: impl Into<String>,
        chapter_index: usize,
        page_index: usize,
        progress_fraction: f64,
    ) -> Self {
        Self {
            book_id: book_id.into(),
            chapter_index,
            page_index,
            progress_fraction,
            updated_at: Utc::now(),
        }
    }
}

/// 书签
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub book_id: String,
    pub chapter_index: usize,
    pub page_index: usize,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// 同一位置的书签共享同一个 id，重复添加会覆盖
    pub fn new(
        book_id: impl Into<String>,
        chapter_index: usize,
        page_index: usize,
        label: impl Into<String>,
    ) -> Self {
        let book_id = book_id.into();
        Self {
            id: Self::make_id(&book_id, chapter_index, page_index),
            book_id,
            chapter_index,
            page_index,
            label: label.into(),
            created_at: Utc::now(),
        }
    }

    /// `sha256("book:chapter:page")` 的十六进制前 12 位
    pub fn make_id(book_id: &str, chapter_index: usize, page_index: usize) -> String {
        let digest = Sha256::digest(format!("{}:{}:{}", book_id, chapter_index, page_index));
        hex_prefix(&digest, 12)
    }

    /// 书签列表的排序键
    pub fn position(&self) -> (usize, usize) {
        (self.chapter_index, self.page_index)
    }
}
