//! 书库持久化
//!
//! - **models**: 阅读进度与书签
//! - **store**: [`ProgressStore`] 契约与内存实现
//! - **database**: redb 本地数据库，同时实现翻译缓存契约

pub mod database;
pub mod models;
pub mod store;

pub use database::{RedbStore, DATABASE_FILE};
pub use models::{Bookmark, ReadingProgress};
pub use store::{MemoryStore, ProgressStore, StoreError, StoreResult};
