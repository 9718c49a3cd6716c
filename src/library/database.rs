//! 基于 redb 的本地数据库
//!
//! 一个文件里保存三张表：翻译缓存、阅读进度、书签。值统一为 JSON 字符串。

use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::library::models::{Bookmark, ReadingProgress};
use crate::library::store::{sort_bookmarks, ProgressStore, StoreResult};
use crate::translation::error::{helpers, TranslationResult};
use crate::translation::storage::{CacheEntry, CacheKey, TranslationCache};

type Table = TableDefinition<'static, &'static str, &'static str>;

const TRANSLATION_CACHE: Table = TableDefinition::new("translation_cache");
const READING_PROGRESS: Table = TableDefinition::new("reading_progress");
const BOOKMARKS: Table = TableDefinition::new("bookmarks");

/// 数据库文件名
pub const DATABASE_FILE: &str = "bookworm.redb";

/// redb 存储
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// 打开或创建数据库，并确保所有表存在
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(&path).map_err(redb::Error::from)?;
        Self::create_tables(&db)?;
        tracing::debug!("已打开数据库: {}", path.display());

        Ok(Self { db, path })
    }

    fn create_tables(db: &Database) -> Result<(), redb::Error> {
        let txn = db.begin_write()?;
        txn.open_table(TRANSLATION_CACHE)?;
        txn.open_table(READING_PROGRESS)?;
        txn.open_table(BOOKMARKS)?;
        txn.commit()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_raw(&self, table: Table, key: &str) -> Result<Option<String>, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn put_raw(&self, table: Table, key: &str, value: &str) -> Result<(), redb::Error> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.insert(key, value)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove_raw(&self, table: Table, key: &str) -> Result<bool, redb::Error> {
        let txn = self.db.begin_write()?;
        let existed = {
            let mut table = txn.open_table(table)?;
            let removed = table.remove(key)?;
            removed.is_some()
        };
        txn.commit()?;
        Ok(existed)
    }

    fn values_raw(&self, table: Table) -> Result<Vec<String>, redb::Error> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table)?;
        let mut values = Vec::new();
        for item in table.iter()? {
            let (_, value) = item?;
            values.push(value.value().to_string());
        }
        Ok(values)
    }

    /// 读取完整的缓存条目
    pub fn cache_entry(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        match self.get_raw(TRANSLATION_CACHE, key.as_str())? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 缓存条目数
    pub fn cache_len(&self) -> StoreResult<usize> {
        let txn = self.db.begin_read().map_err(redb::Error::from)?;
        let table = txn
            .open_table(TRANSLATION_CACHE)
            .map_err(redb::Error::from)?;
        let len = table.len().map_err(redb::Error::from)?;
        Ok(len as usize)
    }

    fn put_json<T: serde::Serialize>(&self, table: Table, key: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string(value)?;
        self.put_raw(table, key, &json)?;
        Ok(())
    }
}

impl TranslationCache for RedbStore {
    fn lookup(&self, key: &CacheKey) -> Option<String> {
        match self.cache_entry(key) {
            Ok(entry) => entry.map(|e| e.translated_text),
            Err(e) => {
                tracing::warn!("读取翻译缓存失败 {}: {}", key, e);
                None
            }
        }
    }

    fn store(&self, entry: &CacheEntry) -> TranslationResult<()> {
        self.put_json(TRANSLATION_CACHE, entry.hash.as_str(), entry)
            .map_err(helpers::cache_error)
    }
}

impl ProgressStore for RedbStore {
    fn save_progress(&self, progress: &ReadingProgress) -> StoreResult<()> {
        self.put_json(READING_PROGRESS, &progress.book_id, progress)
    }

    fn load_progress(&self, book_id: &str) -> StoreResult<Option<ReadingProgress>> {
        match self.get_raw(READING_PROGRESS, book_id)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn add_bookmark(&self, bookmark: &Bookmark) -> StoreResult<()> {
        self.put_json(BOOKMARKS, &bookmark.id, bookmark)
    }

    fn remove_bookmark(&self, bookmark_id: &str) -> StoreResult<bool> {
        Ok(self.remove_raw(BOOKMARKS, bookmark_id)?)
    }

    fn list_bookmarks(&self, book_id: &str) -> StoreResult<Vec<Bookmark>> {
        let mut bookmarks = Vec::new();
        for json in self.values_raw(BOOKMARKS)? {
            let bookmark: Bookmark = serde_json::from_str(&json)?;
            if bookmark.book_id == book_id {
                bookmarks.push(bookmark);
            }
        }
        sort_bookmarks(&mut bookmarks);
        Ok(bookmarks)
    }
}
