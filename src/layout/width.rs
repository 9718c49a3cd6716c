//! 显示宽度与折行
//!
//! 宽度只区分两类字形：East-Asian Wide/Fullwidth 记 2 列，其余一律记 1 列。

use unicode_width::UnicodeWidthChar;

/// 单个字形的显示宽度
pub fn glyph_width(c: char) -> usize {
    if UnicodeWidthChar::width(c) == Some(2) {
        2
    } else {
        1
    }
}

/// 字符串的显示宽度
pub fn display_width(text: &str) -> usize {
    text.chars().map(glyph_width).sum()
}

/// 是否包含宽字形
pub fn has_wide_glyph(text: &str) -> bool {
    text.chars().any(|c| glyph_width(c) == 2)
}

/// 将段落折成不超过 `width` 列的行
///
/// 空白段落返回单个空行。纯单宽段落按单词折行，超长单词按字符切开；
/// 含宽字形的段落按累计宽度逐字折行，并丢弃折行处产生的一个行首空格。
pub fn wrap_paragraph(text: &str, width: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![String::new()];
    }
    let width = width.max(2);

    let lines = if has_wide_glyph(text) {
        wrap_by_glyph(text, width)
    } else {
        wrap_by_word(text, width)
    };

    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

fn wrap_by_word(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = display_width(word);
        let sep_width = if current.is_empty() { 0 } else { 1 };

        if current_width + sep_width + word_width <= width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        if word_width <= width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        for c in word.chars() {
            let w = glyph_width(c);
            if current_width + w > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// 按累计显示宽度逐字折行，保留原有的行首缩进
pub fn wrap_by_glyph(text: &str, width: usize) -> Vec<String> {
    let width = width.max(2);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for c in text.chars() {
        let w = glyph_width(c);
        if current_width + w > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
            if c == ' ' {
                continue;
            }
        }
        current.push(c);
        current_width += w;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// 截断或补空格到恰好 `width` 列
///
/// 截断时宽字形不会被劈开；若因此差一列则补一个空格。
pub fn fit_to_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len() + width);
    let mut used = 0usize;

    for c in text.chars() {
        let w = glyph_width(c);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }

    out.extend(std::iter::repeat(' ').take(width - used));
    out
}
