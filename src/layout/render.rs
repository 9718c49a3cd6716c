//! 页面渲染
//!
//! 输出恰好 `page_height` 行，每行补齐或截断到当前列宽；
//! 双页模式把偶数页放左、下一页放右，中间用 [`DIVIDER`] 连接。

use crate::layout::paginator::{ChapterLayout, DIVIDER};
use crate::layout::width::fit_to_width;

/// 渲染单页；越界页渲染为空白页
pub fn render_page(layout: &ChapterLayout, page_index: usize) -> Vec<String> {
    (0..layout.page_height)
        .map(|row| fit_to_width(line_at(layout, page_index, row), layout.column_width))
        .collect()
}

/// 渲染左右两页
pub fn render_spread(layout: &ChapterLayout, left_index: usize) -> Vec<String> {
    (0..layout.page_height)
        .map(|row| {
            format!(
                "{}{}{}",
                fit_to_width(line_at(layout, left_index, row), layout.column_width),
                DIVIDER,
                fit_to_width(line_at(layout, left_index + 1, row), layout.column_width)
            )
        })
        .collect()
}

/// 按模式渲染当前视图
pub fn render(layout: &ChapterLayout, page_index: usize, dual: bool) -> Vec<String> {
    if dual {
        render_spread(layout, page_index - page_index % 2)
    } else {
        render_page(layout, page_index)
    }
}

fn line_at(layout: &ChapterLayout, page_index: usize, row: usize) -> &str {
    layout
        .page(page_index)
        .and_then(|page| page.lines.get(row))
        .map(String::as_str)
        .unwrap_or("")
}
