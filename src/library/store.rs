//! 进度与书签存储契约

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use crate::library::models::{Bookmark, ReadingProgress};

/// 存储错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("数据库错误: {0}")]
    Database(#[from] redb::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 阅读进度与书签的持久化契约
///
/// 调用方把写入视为尽力而为：失败会被记录，但不阻塞导航。
pub trait ProgressStore: Send + Sync {
    /// 覆盖保存一本书的进度
    fn save_progress(&self, progress: &ReadingProgress) -> StoreResult<()>;

    fn load_progress(&self, book_id: &str) -> StoreResult<Option<ReadingProgress>>;

    /// 同 id 的书签被覆盖
    fn add_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()>;

    /// 返回书签是否存在
    fn remove_bookmark(&self, bookmark_id: &str) -> StoreResult<bool>;

    /// 按章节、页码排序
    fn list_bookmarks(&self, book_id: &str) -> StoreResult<Vec<Bookmark>>;
}

pub(crate) fn sort_bookmarks(bookmarks: &mut [Bookmark]) {
    bookmarks.sort_by_key(Bookmark::position);
}

/// 内存存储，用于测试和不需要持久化的会话
#[derive(Debug, Default)]
pub struct MemoryStore {
    progress: Mutex<HashMap<String, ReadingProgress>>,
    bookmarks: Mutex<BTreeMap<String, Bookmark>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self) -> MutexGuard<'_, HashMap<String, ReadingProgress>> {
        self.progress.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn bookmarks(&self) -> MutexGuard<'_, BTreeMap<String, Bookmark>> {
        self.bookmarks.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ProgressStore for MemoryStore {
    fn save_progress(&self, progress: &ReadingProgress) -> StoreResult<()> {
        self.progress()
            .insert(progress.book_id.clone(), progress.clone());
        Ok(())
    }

    fn load_progress(&self, book_id: &str) -> StoreResult<Option<ReadingProgress>> {
        Ok(self.progress().get(book_id).cloned())
    }

    fn add_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        self.bookmarks()
            .insert(bookmark.id.clone(), bookmark.clone());
        Ok(())
    }

    fn remove_bookmark(&self, bookmark_id: &str) -> StoreResult<bool> {
        Ok(self.bookmarks().remove(bookmark_id).is_some())
    }

    fn list_bookmarks(&self, book_id: &str) -> StoreResult<Vec<Bookmark>> {
        let mut list: Vec<Bookmark> = self
            .bookmarks()
            .values()
            .filter(|b| b.book_id == book_id)
            .cloned()
            .collect();
        sort_bookmarks(&mut list);
        Ok(list)
    }
}
