//! 阅读模块
//!
//! - **session**: 阅读会话状态机、预取协调与完成队列
//! - **export**: 双语导出
//! - **error**: 会话错误

pub mod error;
pub mod export;
pub mod session;

pub use error::{ReaderError, ReaderResult};
pub use export::{export_bilingual, export_path, render_bilingual, translation_progress};
pub use session::{
    Cursor, Notice, NoticeLevel, PrefetchTag, ReaderSession, SessionEvent, SessionMode,
    PREFETCH_AHEAD,
};
