//! 分页集成测试
//!
//! 覆盖确定性、宽度上限、段落区间覆盖以及双页渲染

use bookworm::document::Chapter;
use bookworm::layout::{
    display_width, reflow, render, LayoutParams, LineSpacing, ParagraphRange, Viewport, DIVIDER,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::TestDataGenerator;

fn params(width: usize, height: usize, spacing: u8, dual: bool) -> LayoutParams {
    LayoutParams::new(Viewport::new(width, height), LineSpacing::new(spacing), dual)
}

fn assert_ranges_cover(ranges: &[ParagraphRange], paragraphs: usize) {
    assert_eq!(ranges[0].start, 0, "first page must start at paragraph 0");
    assert_eq!(ranges[ranges.len() - 1].end, paragraphs - 1);
    for pair in ranges.windows(2) {
        assert!(pair[1].start >= pair[0].start, "ranges must be non-decreasing");
        assert!(pair[1].start <= pair[0].end + 1, "ranges must not skip paragraphs");
        assert!(pair[1].start <= pair[1].end);
    }
}

/// 测试各种视口下的宽度上限与覆盖性
#[test]
fn test_width_bound_and_coverage_across_viewports() {
    let chapter = Chapter::new(0, "Mixed", TestDataGenerator::mixed_paragraphs(12));

    for width in [10, 17, 24, 40, 81] {
        for height in [3, 5, 11] {
            for spacing in 0..=3 {
                for dual in [false, true] {
                    let p = params(width, height, spacing, dual);
                    let layout = reflow(&chapter, &p, None);

                    for page in &layout.pages {
                        assert_eq!(page.lines.len(), height);
                        for line in &page.lines {
                            assert!(
                                display_width(line) <= layout.column_width,
                                "line {:?} exceeds column width {}",
                                line,
                                layout.column_width
                            );
                        }
                    }
                    assert_eq!(layout.pages.len(), layout.ranges.len());
                    assert_ranges_cover(&layout.ranges, chapter.paragraphs.len());
                }
            }
        }
    }

    println!("✅ Width bound and coverage test passed");
}

/// 测试相同参数总是得到相同结果
#[test]
fn test_reflow_determinism() {
    let chapter = Chapter::new(0, "Mixed", TestDataGenerator::mixed_paragraphs(30));
    let lookup = |p: &str| {
        if p.starts_with("第") {
            Some("translated paragraph with enough words to wrap twice at least".to_string())
        } else {
            None
        }
    };
    let p = params(33, 7, 2, false);

    let first = reflow(&chapter, &p, Some(&lookup));
    let second = reflow(&chapter, &p, Some(&lookup));
    assert_eq!(first, second);
    assert_ranges_cover(&first.ranges, chapter.paragraphs.len());

    println!("✅ Determinism test passed");
}

/// 测试中英文段落的折行方式
#[test]
fn test_mixed_script_scenario() {
    let chapter = Chapter::new(
        0,
        "Scenario",
        TestDataGenerator::strings(&[
            "Hello world, this is a test of wrapping.",
            "第二段包含中文字符测试宽度计算。",
        ]),
    );
    let layout = reflow(&chapter, &params(20, 10, 1, false), None);
    let lines = &layout.pages[0].lines;

    // 英文按单词折行
    assert_eq!(lines[0], "Hello world, this is");
    assert_eq!(lines[1], "a test of wrapping.");
    assert_eq!(lines[2], "");
    // 中文每行 10 个字
    assert_eq!(lines[3], "第二段包含中文字符测");
    assert_eq!(lines[4], "试宽度计算。");
    assert_eq!(layout.page_count(), 1);
    assert_eq!(layout.ranges[0], ParagraphRange { start: 0, end: 1 });

    println!("✅ Mixed script scenario test passed");
}

/// 测试译文行与空行归属前一段
#[test]
fn test_translation_lines_attributed_to_source() {
    let chapter = Chapter::new(0, "T", TestDataGenerator::strings(&["one", "two", "three"]));
    let lookup = |p: &str| Some(format!("{}-t", p));
    let layout = reflow(&chapter, &params(20, 3, 1, false), Some(&lookup));

    // one, ▸one-t, "", two, ▸two-t, "", three, ▸three-t
    assert_eq!(layout.page_count(), 3);
    assert_eq!(layout.pages[0].lines[1], "  ▸ one-t");
    assert_eq!(layout.ranges[0], ParagraphRange { start: 0, end: 0 });
    assert_eq!(layout.ranges[1], ParagraphRange { start: 1, end: 1 });
    assert_eq!(layout.ranges[2], ParagraphRange { start: 2, end: 2 });

    println!("✅ Translation attribution test passed");
}

/// 测试双页渲染的宽度与配对
#[test]
fn test_dual_render_pairs_even_and_odd_pages() {
    let chapter = Chapter::new(
        0,
        "Dual",
        (0..10).map(|i| format!("line {}", i)).collect(),
    );
    let p = params(43, 4, 0, true);
    let layout = reflow(&chapter, &p, None);
    assert_eq!(layout.column_width, 20);
    assert_eq!(layout.page_count(), 3);

    let spread = render(&layout, 2, true);
    assert_eq!(spread.len(), 4);
    for line in &spread {
        assert_eq!(display_width(line), 43);
        assert!(line.contains(DIVIDER));
    }
    assert!(spread[0].starts_with("line 8"));
    // 第 4 页不存在，右侧为空白
    assert!(spread[0].ends_with(&" ".repeat(20)));

    println!("✅ Dual render test passed");
}
