//! 分页器
//!
//! [`reflow`] 是纯函数：相同的章节、参数和译文查询结果总是得到相同的分页。
//! 页面按固定高度切分整章的折行结果，不做跨页平衡。

use serde::{Deserialize, Serialize};

use crate::document::Chapter;
use crate::layout::width::{wrap_by_glyph, wrap_paragraph};
use crate::translation::TranslationEngine;

pub const MIN_VIEWPORT_WIDTH: usize = 10;
pub const MIN_VIEWPORT_HEIGHT: usize = 3;
pub const FALLBACK_WIDTH: usize = 72;
pub const FALLBACK_HEIGHT: usize = 20;

/// 双页模式中间的分隔列
pub const DIVIDER: &str = " │ ";
pub const DIVIDER_WIDTH: usize = 3;

/// 译文行前缀
pub const TRANSLATION_PREFIX: &str = "  ▸ ";

/// 空章节的占位行
pub const EMPTY_PLACEHOLDER: &str = "(empty)";

/// 视口尺寸（列 × 行）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// 过小的视口替换为固定的后备尺寸
    pub fn normalized(self) -> Self {
        if self.width < MIN_VIEWPORT_WIDTH || self.height < MIN_VIEWPORT_HEIGHT {
            Self::new(FALLBACK_WIDTH, FALLBACK_HEIGHT)
        } else {
            self
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(FALLBACK_WIDTH, FALLBACK_HEIGHT)
    }
}

/// 段间空行数，取值 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineSpacing(u8);

impl LineSpacing {
    pub const MAX: u8 = 3;
    const LABELS: [&'static str; 4] = ["Compact", "Normal", "Wide", "X-Wide"];

    /// 超出范围的值被钳制到 3
    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn lines(self) -> usize {
        self.0 as usize
    }

    pub fn increase(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    pub fn decrease(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub fn label(self) -> &'static str {
        Self::LABELS[self.0 as usize]
    }
}

impl Default for LineSpacing {
    fn default() -> Self {
        Self(1)
    }
}

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutParams {
    pub viewport: Viewport,
    pub spacing: LineSpacing,
    pub dual: bool,
}

impl LayoutParams {
    pub fn new(viewport: Viewport, spacing: LineSpacing, dual: bool) -> Self {
        Self {
            viewport,
            spacing,
            dual,
        }
    }

    /// 实际用于折行的列宽
    pub fn column_width(&self) -> usize {
        let width = self.viewport.normalized().width;
        if self.dual {
            (width - DIVIDER_WIDTH) / 2
        } else {
            width
        }
    }

    pub fn page_height(&self) -> usize {
        self.viewport.normalized().height
    }
}

/// 译文查询
pub trait TranslationLookup {
    /// 返回段落的缓存译文
    fn lookup(&self, paragraph: &str) -> Option<String>;
}

impl<F> TranslationLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, paragraph: &str) -> Option<String> {
        self(paragraph)
    }
}

impl TranslationLookup for TranslationEngine {
    fn lookup(&self, paragraph: &str) -> Option<String> {
        self.get_cached(paragraph)
    }
}

/// 一页：恰好 `page_height` 行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
}

/// 页面对应的段落区间（闭区间）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRange {
    pub start: usize,
    pub end: usize,
}

impl ParagraphRange {
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }
}

/// 一章的分页结果，整体替换，不就地修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterLayout {
    pub pages: Vec<Page>,
    pub ranges: Vec<ParagraphRange>,
    pub column_width: usize,
    pub page_height: usize,
}

impl ChapterLayout {
    /// 至少为 1
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn range(&self, index: usize) -> Option<ParagraphRange> {
        self.ranges.get(index).copied()
    }

    /// 包含该段落的第一页
    pub fn page_of_paragraph(&self, paragraph: usize) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(paragraph))
    }

    fn placeholder(column_width: usize, page_height: usize) -> Self {
        let mut lines = vec![String::new(); page_height];
        lines[0] = EMPTY_PLACEHOLDER.to_string();
        Self {
            pages: vec![Page { lines }],
            ranges: vec![ParagraphRange { start: 0, end: 0 }],
            column_width,
            page_height,
        }
    }
}

/// 将一章折行并分页
///
/// 传入 `lookup` 时，每个段落之后紧跟其缓存译文（以 [`TRANSLATION_PREFIX`] 开头，
/// 逐字折行以保留缩进）；
/// 没有译文或译文为空的段落不插入译文行。段间空行与译文行都归属于前一段落。
pub fn reflow(
    chapter: &Chapter,
    params: &LayoutParams,
    lookup: Option<&dyn TranslationLookup>,
) -> ChapterLayout {
    let column_width = params.column_width();
    let page_height = params.page_height();
    let spacing = params.spacing.lines();

    if chapter.paragraphs.is_empty() {
        return ChapterLayout::placeholder(column_width, page_height);
    }

    let mut lines: Vec<String> = Vec::new();
    let mut owners: Vec<usize> = Vec::new();
    let last = chapter.paragraphs.len() - 1;

    for (index, paragraph) in chapter.paragraphs.iter().enumerate() {
        let wrapped = wrap_paragraph(paragraph, column_width);
        owners.extend(std::iter::repeat(index).take(wrapped.len()));
        lines.extend(wrapped);

        if let Some(translated) = lookup.and_then(|l| l.lookup(paragraph)) {
            if !translated.is_empty() {
                let wrapped = wrap_by_glyph(
                    &format!("{}{}", TRANSLATION_PREFIX, translated),
                    column_width,
                );
                owners.extend(std::iter::repeat(index).take(wrapped.len()));
                lines.extend(wrapped);
            }
        }

        if index < last {
            lines.extend(std::iter::repeat(String::new()).take(spacing));
            owners.extend(std::iter::repeat(index).take(spacing));
        }
    }

    let mut pages = Vec::with_capacity(lines.len() / page_height + 1);
    let mut ranges = Vec::with_capacity(pages.capacity());

    for (chunk, chunk_owners) in lines.chunks(page_height).zip(owners.chunks(page_height)) {
        let mut page_lines = chunk.to_vec();
        page_lines.resize(page_height, String::new());
        pages.push(Page { lines: page_lines });

        let start = chunk_owners.iter().copied().min().unwrap_or(0);
        let end = chunk_owners.iter().copied().max().unwrap_or(0);
        ranges.push(ParagraphRange { start, end });
    }

    ChapterLayout {
        pages,
        ranges,
        column_width,
        page_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::width::display_width;

    fn chapter(paragraphs: &[&str]) -> Chapter {
        Chapter::new(0, "Test", paragraphs.iter().map(|p| p.to_string()).collect())
    }

    fn params(width: usize, height: usize, spacing: u8, dual: bool) -> LayoutParams {
        LayoutParams::new(Viewport::new(width, height), LineSpacing::new(spacing), dual)
    }

    #[test]
    fn test_degenerate_viewport_falls_back() {
        assert_eq!(Viewport::new(9, 50).normalized(), Viewport::new(72, 20));
        assert_eq!(Viewport::new(80, 2).normalized(), Viewport::new(72, 20));
        assert_eq!(Viewport::new(10, 3).normalized(), Viewport::new(10, 3));

        let layout = reflow(&chapter(&["hello"]), &params(4, 1, 1, false), None);
        assert_eq!(layout.column_width, 72);
        assert_eq!(layout.page_height, 20);
    }

    #[test]
    fn test_dual_column_width() {
        assert_eq!(params(80, 20, 1, true).column_width(), 38);
        assert_eq!(params(80, 20, 1, false).column_width(), 80);
        assert_eq!(params(10, 20, 1, true).column_width(), 3);
    }

    #[test]
    fn test_line_spacing_is_clamped() {
        assert_eq!(LineSpacing::new(9).get(), 3);
        assert_eq!(LineSpacing::new(3).increase().get(), 3);
        assert_eq!(LineSpacing::new(0).decrease().get(), 0);
        assert_eq!(LineSpacing::default().label(), "Normal");
        assert_eq!(LineSpacing::new(3).label(), "X-Wide");
    }

    #[test]
    fn test_empty_chapter_yields_placeholder() {
        let layout = reflow(&chapter(&[]), &params(40, 5, 1, false), None);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.pages[0].lines[0], EMPTY_PLACEHOLDER);
        assert_eq!(layout.pages[0].lines.len(), 5);
        assert_eq!(layout.ranges, vec![ParagraphRange { start: 0, end: 0 }]);
    }

    #[test]
    fn test_spacing_lines_between_paragraphs_only() {
        let layout = reflow(&chapter(&["a", "b", "c"]), &params(20, 10, 2, false), None);
        let lines = &layout.pages[0].lines;
        assert_eq!(&lines[..7], &["a", "", "", "b", "", "", "c"]);
        // 尾部只有补齐行
        assert!(lines[7..].iter().all(|l| l.is_empty()));
        assert_eq!(layout.ranges[0], ParagraphRange { start: 0, end: 2 });
    }

    #[test]
    fn test_pages_chunk_at_fixed_height() {
        let paragraphs: Vec<String> = (0..10).map(|i| format!("paragraph {}", i)).collect();
        let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
        let layout = reflow(&chapter(&refs), &params(20, 4, 1, false), None);

        // 10 段 + 9 个空行 = 19 行，4 行一页
        assert_eq!(layout.page_count(), 5);
        assert!(layout.pages.iter().all(|p| p.lines.len() == 4));
        assert_eq!(layout.ranges[0], ParagraphRange { start: 0, end: 1 });
        assert_eq!(layout.ranges[1], ParagraphRange { start: 2, end: 3 });
        assert_eq!(layout.ranges[4], ParagraphRange { start: 8, end: 9 });
    }

    #[test]
    fn test_translation_lines_follow_paragraph() {
        let lookup = |p: &str| match p {
            "Hello" => Some("你好".to_string()),
            "World" => Some("earth".to_string()),
            "Empty" => Some(String::new()),
            _ => None,
        };
        let layout = reflow(
            &chapter(&["Hello", "Empty", "World"]),
            &params(20, 10, 0, false),
            Some(&lookup),
        );
        let lines = &layout.pages[0].lines;
        assert_eq!(lines[0], "Hello");
        assert_eq!(lines[1], "  ▸ 你好");
        assert_eq!(lines[2], "Empty");
        assert_eq!(lines[3], "World");
        assert_eq!(lines[4], "  ▸ earth");
        assert_eq!(layout.ranges[0], ParagraphRange { start: 0, end: 2 });
    }

    #[test]
    fn test_reflow_is_deterministic_and_bounded() {
        let ch = chapter(&[
            "Hello world, this is a test of wrapping.",
            "第二段包含中文字符测试宽度计算。",
        ]);
        let p = params(20, 10, 1, false);
        let a = reflow(&ch, &p, None);
        let b = reflow(&ch, &p, None);
        assert_eq!(a, b);

        for page in &a.pages {
            for line in &page.lines {
                assert!(display_width(line) <= 20);
            }
        }
        assert_eq!(a.pages[0].lines[0], "Hello world, this is");
        assert_eq!(a.pages[0].lines[3].chars().count(), 10);
    }

    #[test]
    fn test_page_of_paragraph() {
        let paragraphs: Vec<String> = (0..6).map(|i| format!("p{}", i)).collect();
        let refs: Vec<&str> = paragraphs.iter().map(String::as_str).collect();
        let layout = reflow(&chapter(&refs), &params(20, 3, 0, false), None);
        assert_eq!(layout.page_of_paragraph(0), Some(0));
        assert_eq!(layout.page_of_paragraph(4), Some(1));
        assert_eq!(layout.page_of_paragraph(99), None);
    }
}
