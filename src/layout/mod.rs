//! 排版模块
//!
//! - **width**: 显示宽度计算与折行
//! - **paginator**: 章节分页与段落区间索引
//! - **render**: 单页与双页的视口渲染

pub mod paginator;
pub mod render;
pub mod width;

pub use paginator::{
    reflow, ChapterLayout, LayoutParams, LineSpacing, Page, ParagraphRange, TranslationLookup,
    Viewport, DIVIDER, EMPTY_PLACEHOLDER, TRANSLATION_PREFIX,
};
pub use render::{render, render_page, render_spread};
pub use width::{display_width, fit_to_width, glyph_width, wrap_paragraph};
