//! # Bookworm
//!
//! 终端电子书阅读核心：支持中日韩宽字符的确定性分页，以及缓存优先的双语翻译。
//!
//! ## 模块组织
//!
//! - `env` - 类型安全的环境变量
//! - `config` - 应用配置（`.env`、`config.toml`、环境变量）
//! - `document` - 文档模型与格式解析器
//! - `layout` - 显示宽度、折行、分页与渲染
//! - `translation` - 翻译引擎、供应商与缓存
//! - `library` - 阅读进度、书签与本地数据库
//! - `reader` - 阅读会话与双语导出

pub mod config;
pub mod document;
pub mod env;
pub mod layout;
pub mod library;
pub mod reader;
pub mod translation;

// Re-export commonly used items for convenience
pub use config::{AppConfig, ConfigManager, ReaderDefaults};
pub use document::{load_document, Book, Chapter, Document, DocumentError, TocEntry};
pub use layout::{reflow, ChapterLayout, LayoutParams, LineSpacing, Viewport};
pub use library::{Bookmark, MemoryStore, ProgressStore, ReadingProgress, RedbStore};
pub use reader::{ReaderError, ReaderSession};
pub use translation::{MemoryCache, TranslationConfig, TranslationEngine, TranslationError};
